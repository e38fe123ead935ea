//! Error types for document storage backends.

use thiserror::Error;

/// Errors raised while reading or writing the persisted document.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("File I/O error")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    /// The document could not be encoded.
    #[error("Failed to serialize document")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The stored document could not be decoded.
    #[error("Failed to deserialize document")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Check if this error is I/O related
    pub fn is_io_error(&self) -> bool {
        matches!(self, StorageError::FileIo { .. })
    }

    /// Check if this error comes from encoding or decoding the document
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            StorageError::SerializationFailed { .. } | StorageError::DeserializationFailed { .. }
        )
    }
}

impl From<StorageError> for crate::Error {
    fn from(err: StorageError) -> Self {
        crate::Error::Storage(err)
    }
}
