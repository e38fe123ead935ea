//! Collecting validator output into the caller-facing validations map.
//!
//! Validators report model-relative field paths. Before they reach the
//! caller the paths are rewritten relative to a prefix (usually the external
//! name of the edited item), and messages for the same path are merged: the
//! first one is stored as a string, a second distinct one turns the entry
//! into a list.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

/// One validator failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Model-relative field path, e.g. `servers.server.<uuid>.name`.
    pub field: String,
    pub message: String,
}

impl ValidationMessage {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Messages recorded for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Messages {
    Single(String),
    Multiple(Vec<String>),
}

impl Messages {
    /// Adds a message; duplicates are ignored.
    pub fn push(&mut self, message: String) {
        match self {
            Messages::Single(first) => {
                if *first != message {
                    *self = Messages::Multiple(vec![std::mem::take(first), message]);
                }
            }
            Messages::Multiple(all) => {
                if !all.contains(&message) {
                    all.push(message);
                }
            }
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            Messages::Single(message) => std::slice::from_ref(message),
            Messages::Multiple(all) => all,
        }
    }
}

/// Field path to message(s) map, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Validations(BTreeMap<String, Messages>);

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        match self.0.entry(field.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(Messages::Single(message));
            }
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().push(message),
        }
    }

    /// Rewrites and records each message.
    ///
    /// With a `node_ref`, that path is replaced by `prefix` inside every field
    /// path; otherwise `prefix` is prepended.
    pub fn aggregate<'m>(
        messages: impl IntoIterator<Item = &'m ValidationMessage>,
        node_ref: Option<&str>,
        prefix: &str,
    ) -> Self {
        let mut validations = Self::new();
        for message in messages {
            validations.add(rewrite_path(&message.field, node_ref, prefix), message.message.as_str());
        }
        validations
    }

    pub fn get(&self, field: &str) -> Option<&Messages> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Messages)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Expresses a model-relative field path relative to `prefix`.
pub fn rewrite_path(field: &str, node_ref: Option<&str>, prefix: &str) -> String {
    match node_ref {
        Some(node_ref) if !node_ref.is_empty() => field.replace(node_ref, prefix),
        _ if prefix.is_empty() => field.to_string(),
        _ => format!("{prefix}.{field}"),
    }
}

/// Outcome of validating a model: empty `result` on success, `failed` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub result: String,
    #[serde(default, skip_serializing_if = "Validations::is_empty")]
    pub validations: Validations,
}

impl ValidationReport {
    pub fn new(validations: Validations) -> Self {
        let result = if validations.is_empty() {
            String::new()
        } else {
            "failed".to_string()
        };
        Self {
            result,
            validations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validations.is_empty()
    }
}
