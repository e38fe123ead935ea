//! Finding references to an entry before it is deleted.
//!
//! References are recognised by text only: any element whose text equals the
//! entry id counts, provided the element's parent is itself an entry (carries
//! a `uuid`) below a versioned module root. Ids stored any other way, for
//! example inside a comma separated list or an attribute, are not found.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{DESCRIPTION_FIELDS, VERSION_ATTR},
    tree::Element,
};

/// One place in the document that refers to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Path of the referring entry starting at its module root, plus its id.
    pub reference: String,
    /// Tag name of the module root.
    pub module: String,
    /// First non-empty description-like field of the referring entry.
    pub description: String,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} {{{}}}", self.module, self.description, self.reference)
    }
}

/// Locates references to an entry id within a document.
pub trait ReferenceScanner: Send + Sync + fmt::Debug {
    fn find_usages(&self, document: &Element, uuid: &str) -> Vec<Usage>;
}

/// Linear scan over every element's text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextScanner;

impl ReferenceScanner for TextScanner {
    fn find_usages(&self, document: &Element, uuid: &str) -> Vec<Usage> {
        let mut usages = Vec::new();
        let mut ancestors = Vec::new();
        scan(document, uuid, &mut ancestors, &mut usages);
        usages
    }
}

/// Depth-first walk; `ancestors` holds the chain from the root to `element`'s parent.
fn scan<'a>(
    element: &'a Element,
    uuid: &str,
    ancestors: &mut Vec<&'a Element>,
    usages: &mut Vec<Usage>,
) {
    if element.text() == Some(uuid)
        && let Some(referring) = ancestors.last()
        && let Some(item_uuid) = referring.uuid()
        && let Some(usage) = usage_of(referring, item_uuid, &ancestors[..ancestors.len() - 1])
    {
        usages.push(usage);
    }

    ancestors.push(element);
    for child in element.children() {
        scan(child, uuid, ancestors, usages);
    }
    ancestors.pop();
}

/// Builds the usage for `referring` if a versioned module root sits above it.
fn usage_of(referring: &Element, item_uuid: &str, above: &[&Element]) -> Option<Usage> {
    let mut path = vec![referring.name()];
    let mut found_root = false;
    for ancestor in above.iter().rev() {
        path.push(ancestor.name());
        if ancestor.attribute(VERSION_ATTR).is_some() {
            found_root = true;
            break;
        }
    }
    if !found_root {
        return None;
    }
    path.reverse();

    let description = DESCRIPTION_FIELDS
        .iter()
        .filter_map(|key| referring.field(key))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string();

    Some(Usage {
        reference: format!("{}.{}", path.join("."), item_uuid),
        module: path[0].to_string(),
        description,
    })
}

/// Newline separated list of usages, as shown to the user.
pub fn render_usages(usages: &[Usage]) -> String {
    usages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
