//! The shared configuration document and its commit discipline.
//!
//! [`Config`] owns the in-memory document behind a read/write lock plus the
//! [`Storage`] it is persisted to. Readers take cheap snapshots; writers take
//! a [`ConfigLock`], which holds the write lock for its whole lifetime so a
//! check made under the lock (such as a safe-delete scan) stays valid until
//! the commit is durable.
//!
//! Every successful commit advances the document generation. Working copies
//! loaded through [`Config::load_model`] remember the generation they were
//! read at, and [`ConfigLock::commit_model`] refuses a copy that an
//! intervening commit made stale.

use std::sync::{
    Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Result,
    constants::READONLY_PRIVILEGE,
    model::{Model, ModelError},
    ordering::SortMode,
    schema::Schema,
    storage::Storage,
    tree::{self, Element},
};

/// Tag name of a freshly created document root.
pub const DOCUMENT_ROOT: &str = "config";

/// Engine-wide options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Principals holding this privilege may not write.
    pub readonly_privilege: String,
    /// Grid page size when a request does not name one; below 1 means all rows.
    pub default_row_count: i64,
    pub sort_mode: SortMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            readonly_privilege: READONLY_PRIVILEGE.to_string(),
            default_row_count: -1,
            sort_mode: SortMode::Natural,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The configuration document and its storage.
#[derive(Debug)]
pub struct Config {
    document: RwLock<Element>,
    /// Only advanced while the write lock is held.
    generation: AtomicU64,
    storage: Arc<dyn Storage>,
}

impl Config {
    /// Loads the stored document, starting empty when nothing is stored.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        let document = storage
            .load()?
            .unwrap_or_else(|| Element::new(DOCUMENT_ROOT));
        Ok(Self {
            document: RwLock::new(document),
            generation: AtomicU64::new(0),
            storage,
        })
    }

    /// Number of commits since the document was opened.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Shared read access to the current document.
    pub fn read(&self) -> RwLockReadGuard<'_, Element> {
        self.document.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current document.
    pub fn snapshot(&self) -> Element {
        self.read().clone()
    }

    /// A working copy of `schema`'s module tagged with the current generation.
    pub fn load_model(&self, schema: Arc<Schema>) -> Model {
        let document = self.read();
        Model::load(schema, &document).at_generation(self.generation())
    }

    /// Enters the write critical section.
    pub fn lock(&self) -> ConfigLock<'_> {
        ConfigLock {
            document: self.document.write().unwrap_or_else(PoisonError::into_inner),
            generation: &self.generation,
            storage: self.storage.as_ref(),
        }
    }
}

/// Exclusive access to the document until dropped.
pub struct ConfigLock<'a> {
    document: RwLockWriteGuard<'a, Element>,
    generation: &'a AtomicU64,
    storage: &'a dyn Storage,
}

impl ConfigLock<'_> {
    pub fn document(&self) -> &Element {
        &self.document
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// A working copy read from the locked document.
    pub fn load_model(&self, schema: Arc<Schema>) -> Model {
        Model::load(schema, &self.document).at_generation(self.generation())
    }

    /// Writes the model's subtree into the document and persists it.
    ///
    /// A copy loaded at an older generation is refused, since writing it
    /// would drop whatever was committed since. When storage fails the
    /// document is restored to its previous state.
    pub fn commit_model(&mut self, model: &Model) -> Result<()> {
        let current = self.generation();
        if let Some(loaded) = model.generation()
            && loaded != current
        {
            warn!(model = %model.id(), loaded, current, "Refusing stale working copy");
            return Err(ModelError::StaleCopy {
                id: model.id().to_string(),
                loaded,
                current,
            }
            .into());
        }

        let before = self.document.clone();
        tree::replace_at(&mut self.document, &model.schema().mount, model.to_element());
        if let Err(err) = self.storage.save(&self.document) {
            warn!(model = %model.id(), error = %err, "Commit failed, restoring document");
            *self.document = before;
            return Err(err);
        }
        self.generation.store(current + 1, Ordering::Release);
        info!(model = %model.id(), generation = current + 1, "Configuration committed");
        Ok(())
    }
}
