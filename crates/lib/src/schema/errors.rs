//! Error types for model definitions.

use thiserror::Error;

/// Errors raised while building or loading a model definition.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A text field mask is not a valid regular expression.
    #[error("Invalid mask '{pattern}': {reason}")]
    InvalidMask { pattern: String, reason: String },

    /// The definition is structurally unusable.
    #[error("Invalid model definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    /// The definition document could not be parsed.
    #[error("Failed to parse model definition")]
    ParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Check if this error comes from a malformed definition document
    pub fn is_parse_error(&self) -> bool {
        matches!(self, SchemaError::ParseFailed { .. })
    }
}

impl From<SchemaError> for crate::Error {
    fn from(err: SchemaError) -> Self {
        crate::Error::Schema(err)
    }
}
