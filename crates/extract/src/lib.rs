pub mod graph_schema;
pub mod prompt;
pub mod schema;

pub use graph_schema::GraphSchema;
pub use schema::{Entity, EntityBuilder, GraphExtraction, Relationship, RelationshipBuilder};
