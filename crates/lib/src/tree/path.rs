//! Dotted paths and entry references.
//!
//! A [`PathBuf`] addresses an element by the tag names of its ancestors,
//! e.g. `servers.server`. A [`Reference`] is a path to a collection followed
//! by the unique id of one of its entries, e.g.
//! `servers.server.9d606689-19e0-48a7-84b2-9173525255d8`.
//!
//! ```rust
//! use confmodel::tree::{PathBuf, Reference};
//! use std::str::FromStr;
//!
//! let path = PathBuf::new().push("servers").push("server");
//! assert_eq!(path.as_str(), "servers.server");
//!
//! let reference = Reference::from_str("servers.server.abc")?;
//! assert_eq!(reference.collection().as_str(), "servers.server");
//! assert_eq!(reference.uuid(), "abc");
//! # Ok::<(), confmodel::tree::TreeError>(())
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::TreeError;

/// Normalizes a path string by cleaning up dots and empty components.
///
/// - Empty string "" → empty string (refers to the starting element)
/// - Leading dots ".servers" → "servers"
/// - Trailing dots "servers." → "servers"
/// - Consecutive dots "servers..server" → "servers.server"
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// An owned, normalized dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathBuf {
    inner: String,
}

impl PathBuf {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a path by normalizing the input string. Never fails.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Adds a path to the end of this path.
    ///
    /// The input is normalized, so `push("a.b")` appends two components and
    /// `push("")` is a no-op.
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if self.inner.is_empty() {
            self.inner = normalized;
        } else {
            self.inner.push('.');
            self.inner.push_str(&normalized);
        }
        self
    }

    /// Returns an iterator over the path components.
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.inner.split('.').filter(|s| !s.is_empty())
    }

    /// Returns the number of components in the path.
    pub fn len(&self) -> usize {
        self.components().count()
    }

    /// Returns `true` if the path has no components.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the parent path, or `None` for a single-component or empty path.
    pub fn parent(&self) -> Option<PathBuf> {
        self.inner.rfind('.').map(|last_dot| PathBuf {
            inner: self.inner[..last_dot].to_string(),
        })
    }

    /// Returns the last component of the path, or `None` if empty.
    pub fn file_name(&self) -> Option<&str> {
        self.components().next_back()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl FromStr for PathBuf {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for PathBuf {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for PathBuf {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<PathBuf> for String {
    fn from(path: PathBuf) -> Self {
        path.inner
    }
}

impl AsRef<str> for PathBuf {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// A collection path plus the id of one of its entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    collection: PathBuf,
    uuid: String,
}

impl Reference {
    /// Builds a reference from a collection path and an entry id.
    pub fn new(collection: impl Into<PathBuf>, uuid: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            uuid: uuid.into(),
        }
    }

    /// The path of the collection holding the entry.
    pub fn collection(&self) -> &PathBuf {
        &self.collection
    }

    /// The id of the addressed entry.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The full dotted form, `collection.uuid`.
    pub fn to_path(&self) -> PathBuf {
        self.collection.clone().push(&self.uuid)
    }
}

impl FromStr for Reference {
    type Err = TreeError;

    /// Splits off the trailing segment as the entry id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = PathBuf::normalize(s);
        match (path.parent(), path.file_name()) {
            (Some(collection), Some(uuid)) => Ok(Self {
                uuid: uuid.to_string(),
                collection,
            }),
            _ => Err(TreeError::InvalidReference {
                reference: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.uuid)
    }
}
