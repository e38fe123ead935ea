//! Volatile storage keeping the last saved document in memory.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use super::Storage;
use crate::{Result, tree::Element};

/// Keeps the last saved document and counts saves.
#[derive(Debug, Default)]
pub struct InMemory {
    document: Mutex<Option<Element>>,
    commits: AtomicUsize,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that starts out holding `document`.
    pub fn with_document(document: Element) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            commits: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// The last saved document.
    pub fn saved(&self) -> Option<Element> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Storage for InMemory {
    fn load(&self) -> Result<Option<Element>> {
        Ok(self.saved())
    }

    fn save(&self, document: &Element) -> Result<()> {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
