//! Error types for model binding and registry lookups.

use thiserror::Error;

/// Errors raised while binding a model to the configuration document.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// No model definition is registered under this id.
    #[error("Unknown model: {id}")]
    UnknownModel { id: String },

    /// The path does not name a field of the model.
    #[error("Field not found: {path}")]
    FieldNotFound { path: String },

    /// The path names a field that is not a repeated (array) field.
    #[error("Not a collection: {path}")]
    NotACollection { path: String },

    /// The field has no option list to render.
    #[error("Field has no options: {path}")]
    NotSelectable { path: String },

    /// The working copy was loaded before another commit to the document.
    #[error("Stale working copy of {id}: loaded at generation {loaded}, document is at {current}")]
    StaleCopy { id: String, loaded: u64, current: u64 },
}

impl ModelError {
    /// Check if this error indicates a missing model or field
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModelError::UnknownModel { .. } | ModelError::FieldNotFound { .. }
        )
    }

    /// Check if this error comes from a path that names no usable field
    pub fn is_addressing(&self) -> bool {
        matches!(
            self,
            ModelError::FieldNotFound { .. }
                | ModelError::NotACollection { .. }
                | ModelError::NotSelectable { .. }
        )
    }

    /// Check if a commit was refused because the document moved on
    pub fn is_stale(&self) -> bool {
        matches!(self, ModelError::StaleCopy { .. })
    }

    /// Check if this error comes from an unregistered model id
    pub fn is_unknown_model(&self) -> bool {
        matches!(self, ModelError::UnknownModel { .. })
    }
}

impl From<ModelError> for crate::Error {
    fn from(err: ModelError) -> Self {
        crate::Error::Model(err)
    }
}
