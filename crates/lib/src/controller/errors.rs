//! Error types for request-facing operations.

use thiserror::Error;

use crate::safe_delete::{Usage, render_usages};

/// Errors that abort a controller operation without mutating anything.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The controller was built without an external model name.
    #[error("Controller has no model name")]
    MissingModelName,

    /// The acting principal holds the read-only privilege.
    #[error("User {user} denied for write access ({privilege} set)")]
    WriteAccessDenied { user: String, privilege: String },

    /// The entry is still referenced elsewhere in the configuration.
    #[error("{}", render_usages(.usages))]
    SafeDeleteBlocked { title: String, usages: Vec<Usage> },
}

impl ControllerError {
    /// Check if this error denies the principal's write
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ControllerError::WriteAccessDenied { .. })
    }

    /// Check if this error refuses a delete because of existing references
    pub fn is_safe_delete_blocked(&self) -> bool {
        matches!(self, ControllerError::SafeDeleteBlocked { .. })
    }

    /// References that blocked a delete.
    pub fn usages(&self) -> &[Usage] {
        match self {
            ControllerError::SafeDeleteBlocked { usages, .. } => usages,
            _ => &[],
        }
    }
}

impl From<ControllerError> for crate::Error {
    fn from(err: ControllerError) -> Self {
        crate::Error::Controller(err)
    }
}
