//! Declarative model definitions.
//!
//! A [`Schema`] describes one configuration module: where it is mounted in
//! the document, its version, and a tree of [`FieldDef`]s. Containers group
//! fields, arrays declare repeated entries, and leaf fields carry a typed
//! validator. Definitions are plain data and can be written in code or loaded
//! from JSON:
//!
//! ```rust
//! use confmodel::schema::{FieldDef, Schema};
//!
//! let schema = Schema::new("OPNsense.DNSCrypt", "OPNsense.dnscrypt", "1.0.0")
//!     .field(FieldDef::container(
//!         "general",
//!         vec![FieldDef::boolean("enabled").default_value("0")],
//!     ))
//!     .field(FieldDef::container(
//!         "servers",
//!         vec![FieldDef::array(
//!             "server",
//!             vec![
//!                 FieldDef::boolean("enabled").default_value("1"),
//!                 FieldDef::text("name").required().unique(),
//!             ],
//!         )],
//!     ));
//!
//! let json = serde_json::to_string(&schema)?;
//! let loaded = Schema::from_json(&json)?;
//! assert!(loaded.field_at(&"servers.server".into()).unwrap().is_array());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{constants::FALSE_TOKEN, relation::RelationField, tree::PathBuf};

pub mod errors;

pub use errors::SchemaError;

fn is_false(b: &bool) -> bool {
    !*b
}

/// A compiled regular expression constraining text field values.
#[derive(Debug, Clone)]
pub struct Mask(Regex);

impl Mask {
    pub fn new(pattern: &str) -> Result<Self, SchemaError> {
        Regex::new(pattern)
            .map(Mask)
            .map_err(|e| SchemaError::InvalidMask {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Mask::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// One selectable value of an option list field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The structural or validation type of a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Groups named child fields.
    Container { fields: Vec<FieldDef> },
    /// Repeated entries, each holding the given fields and a `uuid` attribute.
    Array { fields: Vec<FieldDef> },
    /// Free text, optionally constrained by a mask.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mask: Option<Mask>,
    },
    /// `0` or `1`.
    Boolean,
    /// Signed integer within optional bounds.
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// One (or with `multiple`, several) values from a fixed list.
    Option {
        options: Vec<Choice>,
        #[serde(default, skip_serializing_if = "is_false")]
        multiple: bool,
    },
    /// Ids of entries selected from other parts of the configuration.
    Relation(RelationField),
}

/// A named field within a container or array entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Values must differ between the entries of the enclosing array.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    /// Replaces the type validator's default message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldDef {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            unique: false,
            message: None,
        }
    }

    pub fn container(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self::with_kind(name, FieldKind::Container { fields })
    }

    pub fn array(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self::with_kind(name, FieldKind::Array { fields })
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Text { mask: None })
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Boolean)
    }

    pub fn integer(name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Self::with_kind(name, FieldKind::Integer { min, max })
    }

    pub fn options(name: impl Into<String>, options: Vec<Choice>) -> Self {
        Self::with_kind(
            name,
            FieldKind::Option {
                options,
                multiple: false,
            },
        )
    }

    pub fn relation(name: impl Into<String>, relation: RelationField) -> Self {
        Self::with_kind(name, FieldKind::Relation(relation))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Constrains a text field; ignored for other kinds.
    pub fn mask(mut self, mask: Mask) -> Self {
        if let FieldKind::Text { mask: slot } = &mut self.kind {
            *slot = Some(mask);
        }
        self
    }

    /// Allows several comma separated values in an option list field.
    pub fn multiple(mut self) -> Self {
        if let FieldKind::Option { multiple, .. } = &mut self.kind {
            *multiple = true;
        }
        self
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(
            self.kind,
            FieldKind::Container { .. } | FieldKind::Array { .. }
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, FieldKind::Array { .. })
    }

    /// Child field definitions of a container or array entry.
    pub fn children(&self) -> &[FieldDef] {
        match &self.kind {
            FieldKind::Container { fields } | FieldKind::Array { fields } => fields,
            _ => &[],
        }
    }

    /// Value a freshly constructed leaf starts with.
    pub fn initial_value(&self) -> String {
        match (&self.default, &self.kind) {
            (Some(value), _) => value.clone(),
            (None, FieldKind::Boolean) => FALSE_TOKEN.to_string(),
            (None, _) => String::new(),
        }
    }
}

/// Definition of one configuration module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Registry identifier, e.g. `OPNsense.DNSCrypt`.
    pub id: String,
    /// Location of the module root within the document.
    pub mount: PathBuf,
    /// Written to the module root's `version` attribute.
    pub version: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(id: impl Into<String>, mount: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mount: mount.into(),
            version: version.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Parses and checks a JSON model definition.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema =
            serde_json::from_str(json).map_err(|source| SchemaError::ParseFailed { source })?;
        schema.check()?;
        Ok(schema)
    }

    /// Tag name of the module root element.
    pub fn root_name(&self) -> &str {
        self.mount.file_name().unwrap_or_default()
    }

    /// Rejects definitions that cannot be bound to a document.
    pub fn check(&self) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidDefinition {
            id: self.id.clone(),
            reason,
        };
        if self.id.is_empty() {
            return Err(invalid("missing id".to_string()));
        }
        if self.mount.is_empty() {
            return Err(invalid("missing mount path".to_string()));
        }
        if self.version.is_empty() {
            return Err(invalid("missing version".to_string()));
        }
        check_fields(&self.fields).map_err(invalid)
    }

    /// Finds the definition addressed by a model-relative path.
    ///
    /// Entry ids inside the path (as in `servers.server.<uuid>.name`) are
    /// skipped.
    pub fn field_at(&self, path: &PathBuf) -> Option<&FieldDef> {
        let mut fields: &[FieldDef] = &self.fields;
        let mut found: Option<&FieldDef> = None;
        let mut after_array = false;
        for step in path.components() {
            let Some(def) = fields.iter().find(|f| f.name == step) else {
                if after_array {
                    after_array = false;
                    continue;
                }
                return None;
            };
            after_array = def.is_array();
            fields = def.children();
            found = Some(def);
        }
        found
    }
}

fn check_fields(fields: &[FieldDef]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.name.is_empty() || field.name.contains('.') {
            return Err(format!("invalid field name '{}'", field.name));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(format!("duplicate field '{}'", field.name));
        }
        check_fields(field.children())?;
    }
    Ok(())
}
