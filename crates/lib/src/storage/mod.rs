//! Durable storage of the configuration document.
//!
//! A [`Storage`] backend only moves whole documents: [`Storage::load`] returns
//! the last saved document (or `None` when nothing was saved yet) and
//! [`Storage::save`] replaces it. Locking and rollback live in
//! [`Config`](crate::config::Config).

use std::fmt::Debug;

use crate::{Result, tree::Element};

pub mod errors;
mod in_memory;
mod json_file;

pub use errors::StorageError;
pub use in_memory::InMemory;
pub use json_file::JsonFile;

/// A place the configuration document is persisted to.
pub trait Storage: Send + Sync + Debug {
    /// Reads the stored document; `None` when nothing has been stored.
    fn load(&self) -> Result<Option<Element>>;

    /// Durably replaces the stored document.
    fn save(&self, document: &Element) -> Result<()>;
}
