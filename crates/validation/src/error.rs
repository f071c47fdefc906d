use std::fmt;
use thiserror::Error;

/// Which end of a relationship failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Construction-time validation failures.
///
/// Every variant carries enough context (field name, offending identifier or
/// tag) to be logged without going back to the input object.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string field was empty or whitespace-only.
    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// A numeric field fell below its lower bound.
    #[error("field '{field}' value {value} is below minimum {min}")]
    BelowMinimum {
        field: &'static str,
        value: u64,
        min: u64,
    },

    /// Two entities in one graph share an identifier.
    #[error("duplicate entity id '{id}'")]
    DuplicateIdentifier { id: String },

    /// A relationship names an entity that is not in the node set.
    #[error("relationship '{relationship_id}' has unknown {endpoint} entity '{id}'")]
    DanglingReference {
        relationship_id: String,
        endpoint: Endpoint,
        id: String,
    },

    /// A relationship points from an entity to itself.
    #[error("relationship source and target must differ (both are '{id}')")]
    SelfReference { id: String },

    /// A schema type list contains the same normalized tag twice.
    #[error("duplicate type tag '{tag}' in '{field}'")]
    DuplicateTypeTag { field: &'static str, tag: String },
}

impl ValidationError {
    pub fn empty(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    /// True for the per-field family (empty value or numeric bound).
    pub fn is_field_error(&self) -> bool {
        matches!(self, Self::EmptyField { .. } | Self::BelowMinimum { .. })
    }

    /// Name of the offending field, when the error is about a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyField { field }
            | Self::BelowMinimum { field, .. }
            | Self::DuplicateTypeTag { field, .. } => Some(field),
            _ => None,
        }
    }
}
