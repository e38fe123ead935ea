//!
//! Confmodel: generic CRUD and validation over a hierarchical configuration document.
//!
//! ## Core Concepts
//!
//! * **Document (`tree::Element`)**: The in-memory configuration tree. Elements carry a tag name, attributes, optional text and ordered children; repeated children form collections whose entries are addressed by a `uuid` attribute.
//! * **Schemas (`schema::Schema`)**: Declarative definitions of configuration modules, registered by id in a `model::ModelRegistry`.
//! * **Models (`model::Model`)**: Working copies of one module subtree. Mutations and validation happen on the copy; only a valid copy is committed.
//! * **Config (`config::Config`)**: The shared document behind a read/write lock plus its `storage::Storage` backend. Commits run inside an exclusive critical section and roll back on storage failure.
//! * **Relations (`relation`)**: Fields selecting entries of other modules, with options resolved from data-source descriptors and cached process-wide.
//! * **Controllers (`controller::ModelController`)**: The request-facing get/add/set/delete/toggle/search operations, safe delete, and the grid action router.

pub mod config;
pub mod constants;
pub mod controller;
pub mod grid;
pub mod model;
pub mod ordering;
pub mod relation;
pub mod safe_delete;
pub mod schema;
pub mod storage;
pub mod tree;
pub mod validation;

/// Re-export the `Registered` trait for implementing compiled-in models.
pub use model::Registered;

/// Result type used throughout the Confmodel library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Confmodel library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured navigation errors from the tree module
    #[error(transparent)]
    Tree(tree::TreeError),

    /// Structured definition errors from the schema module
    #[error(transparent)]
    Schema(schema::SchemaError),

    /// Structured binding errors from the model module
    #[error(transparent)]
    Model(model::ModelError),

    /// Structured persistence errors from the storage module
    #[error(transparent)]
    Storage(storage::StorageError),

    /// Structured operation errors from the controller module
    #[error(transparent)]
    Controller(controller::ControllerError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Tree(_) => "tree",
            Error::Schema(_) => "schema",
            Error::Model(_) => "model",
            Error::Storage(_) => "storage",
            Error::Controller(_) => "controller",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_not_found(),
            Error::Model(model_err) => model_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error comes from addressing something that is not there
    /// or not of the expected shape.
    pub fn is_path_error(&self) -> bool {
        match self {
            Error::Tree(_) => true,
            Error::Model(model_err) => model_err.is_addressing(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Controller(controller_err) => controller_err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// Check if this error refused a delete because the entry is still referenced.
    pub fn is_safe_delete_blocked(&self) -> bool {
        match self {
            Error::Controller(controller_err) => controller_err.is_safe_delete_blocked(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Storage(storage_err) => storage_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if a commit was refused because its working copy is out of date.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Model(model_err) => model_err.is_stale(),
            _ => false,
        }
    }

    /// Check if this error is storage-related.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
