pub mod article;
pub mod chunk;
pub mod failure;

pub use article::{ArticleContent, ArticleMetadata};
pub use chunk::TextChunk;
pub use failure::{FailureLog, ScrapeOutcome, ScrapingFailure};
