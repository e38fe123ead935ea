//! Error types for tree navigation.

use thiserror::Error;

/// Errors raised while navigating a configuration tree.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A step of a dotted path does not exist below the starting element.
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The full path that failed to resolve
        path: String,
    },

    /// A reference string lacks either the collection path or the entry id.
    #[error("Invalid reference: '{reference}'")]
    InvalidReference {
        /// The reference as supplied by the caller
        reference: String,
    },
}

impl TreeError {
    /// Check if this error indicates a missing path
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::PathNotFound { .. })
    }

    /// Get the path or reference this error is about
    pub fn path(&self) -> &str {
        match self {
            TreeError::PathNotFound { path } => path,
            TreeError::InvalidReference { reference } => reference,
        }
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
