//! In-memory configuration tree.
//!
//! The configuration document is a rooted, ordered tree of [`Element`]s. Each
//! element has a tag name, string attributes, optional text content and an
//! ordered list of children. Children sharing a tag name under one parent form
//! a collection; members of a collection carry a unique `uuid` attribute.
//!
//! Navigation is by dotted tag-name paths:
//!
//! ```rust
//! use confmodel::tree::{self, Element, Reference};
//! use std::str::FromStr;
//!
//! let mut root = Element::new("dnscrypt");
//! let servers = root.ensure_child("servers");
//! servers.push_child(
//!     Element::new("server")
//!         .with_attribute("uuid", "abc")
//!         .with_field("name", "quad9"),
//! );
//!
//! let collection = tree::resolve_collection(&root, &"servers.server".into())?;
//! assert_eq!(collection.len(), 1);
//!
//! let entry = tree::resolve_reference(&root, &Reference::from_str("servers.server.abc")?)?;
//! assert_eq!(entry.and_then(|e| e.field("name")), Some("quad9"));
//! # Ok::<(), confmodel::tree::TreeError>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::UUID_ATTR;

pub mod errors;
pub mod path;

pub use errors::TreeError;
pub use path::{PathBuf, Reference};

/// A single element of the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

/// Typed view of what a tag name resolves to below an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    /// A childless element holding (possibly empty) scalar text.
    Leaf(&'a Element),
    /// A single structural element.
    Element(&'a Element),
    /// Repeated entries sharing one tag name.
    Collection(&'a [Element], &'a str),
}

impl<'a> Node<'a> {
    /// The single element behind a leaf or structural node.
    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            Node::Leaf(e) | Node::Element(e) => Some(e),
            Node::Collection(..) => None,
        }
    }

    /// Attributes of a single element, `None` for collections.
    pub fn attributes(&self) -> Option<&'a BTreeMap<String, String>> {
        self.as_element().map(Element::attributes)
    }

    /// Scalar text of a leaf.
    pub fn text(&self) -> Option<&'a str> {
        match self {
            Node::Leaf(e) => Some(e.text().unwrap_or_default()),
            _ => None,
        }
    }

    /// All elements behind this node, in document order.
    pub fn entries(&self) -> Vec<&'a Element> {
        match self {
            Node::Leaf(e) | Node::Element(e) => vec![e],
            Node::Collection(siblings, name) => {
                siblings.iter().filter(|c| c.name == *name).collect()
            }
        }
    }
}

impl Element {
    /// Creates an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Creates a childless element holding `text`.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = Some(text.into());
        element
    }

    /// Builder variant of [`Element::set_attribute`].
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder variant of [`Element::set_field`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Builder variant of [`Element::push_child`].
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// The `uuid` attribute, present on repeated entries.
    pub fn uuid(&self) -> Option<&str> {
        self.attribute(UUID_ATTR).filter(|u| !u.is_empty())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Iterates over the children carrying the given tag name.
    pub fn children_named(&self, name: &str) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given tag name.
    pub fn first_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn first_child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Returns the first child named `name`, appending an empty one if absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let position = match self.children.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[position]
    }

    /// Resolves a tag name into a typed [`Node`].
    ///
    /// Several children with the same name, or a single one carrying a
    /// `uuid`, form a collection. A single childless element is a leaf.
    pub fn child(&self, name: &str) -> Option<Node<'_>> {
        let mut matches = self.children_named(name);
        let first = matches.next()?;
        if matches.next().is_some() || first.uuid().is_some() {
            Some(Node::Collection(&self.children, first.name.as_str()))
        } else if first.children.is_empty() {
            Some(Node::Leaf(first))
        } else {
            Some(Node::Element(first))
        }
    }

    /// Text of the first child named `name`; `None` when the child is absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.first_child(name)
            .map(|c| c.text.as_deref().unwrap_or_default())
    }

    /// Sets the text of the first child named `name`, creating it if needed.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.ensure_child(&name).set_text(value);
    }

    /// Repeated entry with the given id among the children named `name`.
    pub fn entry(&self, name: &str, uuid: &str) -> Option<&Element> {
        self.children_named(name).find(|c| c.uuid() == Some(uuid))
    }

    pub fn entry_mut(&mut self, name: &str, uuid: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .find(|c| c.name == name && c.uuid() == Some(uuid))
    }

    /// Removes the entry named `name` with id `uuid`; returns whether one was removed.
    pub fn remove_entry(&mut self, name: &str, uuid: &str) -> bool {
        let before = self.children.len();
        self.children
            .retain(|c| !(c.name == name && c.uuid() == Some(uuid)));
        self.children.len() != before
    }
}

/// Steps through child tag names from `root`.
///
/// Fails with [`TreeError::PathNotFound`] as soon as a step is absent. The
/// empty path resolves to `root` itself.
pub fn resolve_path<'a>(root: &'a Element, path: &PathBuf) -> Result<&'a Element, TreeError> {
    let mut current = root;
    for step in path.components() {
        current = current
            .first_child(step)
            .ok_or_else(|| TreeError::PathNotFound {
                path: path.to_string(),
            })?;
    }
    Ok(current)
}

/// Mutable variant of [`resolve_path`].
pub fn resolve_path_mut<'a>(
    root: &'a mut Element,
    path: &PathBuf,
) -> Result<&'a mut Element, TreeError> {
    let mut current = root;
    for step in path.components() {
        current = current
            .first_child_mut(step)
            .ok_or_else(|| TreeError::PathNotFound {
                path: path.to_string(),
            })?;
    }
    Ok(current)
}

/// Resolves the parent of a collection path and returns the parent plus the
/// collection's tag name.
fn split_collection(path: &PathBuf) -> Result<(PathBuf, &str), TreeError> {
    let name = path.file_name().ok_or_else(|| TreeError::PathNotFound {
        path: path.to_string(),
    })?;
    Ok((path.parent().unwrap_or_default(), name))
}

/// Returns the repeated entries at `path`, in document order.
///
/// The parent of the collection must exist; an existing parent without
/// entries yields an empty collection.
pub fn resolve_collection<'a>(
    root: &'a Element,
    path: &PathBuf,
) -> Result<Vec<&'a Element>, TreeError> {
    let (parent, name) = split_collection(path)?;
    let parent = resolve_path(root, &parent).map_err(|_| TreeError::PathNotFound {
        path: path.to_string(),
    })?;
    Ok(parent.children_named(name).collect())
}

/// Mutable access to the element owning the collection at `path`, plus the
/// collection's tag name.
pub fn resolve_collection_parent_mut<'a, 'p>(
    root: &'a mut Element,
    path: &'p PathBuf,
) -> Result<(&'a mut Element, &'p str), TreeError> {
    let (parent, name) = split_collection(path)?;
    let parent = resolve_path_mut(root, &parent).map_err(|_| TreeError::PathNotFound {
        path: path.to_string(),
    })?;
    Ok((parent, name))
}

/// Resolves `collection.uuid` to a single entry.
///
/// A missing id is not an error and yields `Ok(None)`; a missing collection
/// parent fails with [`TreeError::PathNotFound`].
pub fn resolve_reference<'a>(
    root: &'a Element,
    reference: &Reference,
) -> Result<Option<&'a Element>, TreeError> {
    Ok(resolve_collection(root, reference.collection())?
        .into_iter()
        .find(|e| e.uuid() == Some(reference.uuid())))
}

/// Mutable variant of [`resolve_reference`].
pub fn resolve_reference_mut<'a>(
    root: &'a mut Element,
    reference: &Reference,
) -> Result<Option<&'a mut Element>, TreeError> {
    let (parent, name) = resolve_collection_parent_mut(root, reference.collection())?;
    Ok(parent.entry_mut(name, reference.uuid()))
}

/// Walks `path` from `root`, creating every missing element on the way.
pub fn ensure_path<'a>(root: &'a mut Element, path: &PathBuf) -> &'a mut Element {
    let mut current = root;
    for step in path.components() {
        current = current.ensure_child(step);
    }
    current
}

/// Puts `element` at `path`, replacing the first element already there.
///
/// Intermediate elements are created as needed. Returns the replaced element.
pub fn replace_at(root: &mut Element, path: &PathBuf, element: Element) -> Option<Element> {
    let Some(name) = path.file_name() else {
        return Some(std::mem::replace(root, element));
    };
    let parent = ensure_path(root, &path.parent().unwrap_or_default());
    match parent.children.iter().position(|c| c.name == name) {
        Some(position) => Some(std::mem::replace(&mut parent.children[position], element)),
        None => {
            parent.children.push(element);
            None
        }
    }
}
