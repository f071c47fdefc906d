pub mod error;
pub mod normalize;

pub use error::{Endpoint, ValidationError};
pub use normalize::{clean_list, generate_id, normalize_types};

/// Open key/value map for properties and metadata whose keys are not known
/// ahead of time. Values are any JSON value.
pub type Properties = serde_json::Map<String, serde_json::Value>;

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Turn a validation failure into a serde error so that deserializing an
/// invalid document fails the same way constructing one does.
pub fn de_error<E: serde::de::Error>(err: ValidationError) -> E {
    E::custom(err)
}
