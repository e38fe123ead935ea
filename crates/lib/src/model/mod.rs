//! Models bound to the configuration document.
//!
//! A [`Model`] is a working copy of one module subtree, shaped by its
//! [`Schema`]. Loading normalizes the copy: missing leaves receive their
//! defaults, containers are created and entries without an id get one.
//! Every mutation happens on the working copy only; nothing reaches the
//! document until the copy is committed through [`Config`](crate::config::Config).
//!
//! Validation covers the fields that differ from the loaded state, so
//! pre-existing data never blocks an unrelated change.

use std::{collections::BTreeMap, sync::Arc};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    Result,
    constants::{FALSE_TOKEN, LIST_SEPARATOR, TRUE_TOKEN, UUID_ATTR, VERSION_ATTR},
    grid::GridRecord,
    relation::{self, OptionData, RelationResolver},
    schema::{FieldDef, FieldKind, Schema},
    tree::{self, Element, PathBuf, Reference, TreeError},
    validation::ValidationMessage,
};

pub mod errors;
pub mod registry;

pub use errors::ModelError;
pub use registry::{ModelDefinition, ModelRegistry, Registered};

const REQUIRED_MESSAGE: &str = "A value is required.";
const UNIQUE_MESSAGE: &str = "Value should be unique.";

/// Working copy of one configuration module.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<Schema>,
    root: Element,
    loaded: Element,
    generation: Option<u64>,
}

impl Model {
    /// Copies the module subtree out of `document`, or starts an empty one.
    pub fn load(schema: Arc<Schema>, document: &Element) -> Self {
        let mut root = match tree::resolve_path(document, &schema.mount) {
            Ok(existing) => existing.clone(),
            Err(_) => Element::new(schema.root_name()),
        };
        normalize(&schema.fields, &mut root);
        Self {
            schema,
            loaded: root.clone(),
            root,
            generation: None,
        }
    }

    /// Marks the document generation this copy was loaded from.
    pub fn at_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Document generation of the load; `None` for copies made outside a [`Config`](crate::config::Config).
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The subtree as it is written back, stamped with the schema version.
    pub fn to_element(&self) -> Element {
        let mut root = self.root.clone();
        root.set_attribute(VERSION_ATTR, self.schema.version.as_str());
        root
    }

    /// Field values of the whole model.
    ///
    /// Leaves map to their text, containers to objects and arrays to objects
    /// keyed by entry id.
    pub fn get_nodes(&self) -> Value {
        Value::Object(nodes_of(&self.schema.fields, &self.root))
    }

    /// Applies posted values to the whole model. Unknown keys are ignored.
    ///
    /// Array entries posted under an id the collection does not hold are
    /// added with a newly generated id.
    pub fn set_nodes(&mut self, values: &Value) {
        if let Value::Object(values) = values {
            apply(&self.schema.fields, &mut self.root, values);
        }
    }

    /// Definition of the array field at `path`.
    pub fn collection_def(&self, path: &PathBuf) -> Result<&FieldDef> {
        let def = self
            .schema
            .field_at(path)
            .ok_or_else(|| TreeError::PathNotFound {
                path: path.to_string(),
            })?;
        if !def.is_array() {
            return Err(ModelError::NotACollection {
                path: path.to_string(),
            }
            .into());
        }
        Ok(def)
    }

    /// Entries of the collection at `path`, in document order.
    pub fn collection(&self, path: &PathBuf) -> Result<Vec<&Element>> {
        self.collection_def(path)?;
        Ok(tree::resolve_collection(&self.root, path)?)
    }

    pub fn entry(&self, reference: &Reference) -> Result<Option<&Element>> {
        self.collection_def(reference.collection())?;
        Ok(tree::resolve_reference(&self.root, reference)?)
    }

    /// Field values of one entry; `None` when the id is absent.
    pub fn entry_nodes(&self, reference: &Reference) -> Result<Option<Map<String, Value>>> {
        let def = self.collection_def(reference.collection())?;
        Ok(tree::resolve_reference(&self.root, reference)?
            .map(|entry| nodes_of(def.children(), entry)))
    }

    /// Field values of a fresh entry for `path`; nothing is attached.
    pub fn default_entry(&self, path: &PathBuf) -> Result<Map<String, Value>> {
        let def = self.collection_def(path)?;
        let entry = new_entry(def, &Uuid::new_v4().to_string());
        Ok(nodes_of(def.children(), &entry))
    }

    /// Appends a new entry with defaults to the collection at `path`.
    pub fn add(&mut self, path: &PathBuf) -> Result<String> {
        let def = self.collection_def(path)?.clone();
        let uuid = Uuid::new_v4().to_string();
        let (parent, _) = tree::resolve_collection_parent_mut(&mut self.root, path)?;
        parent.push_child(new_entry(&def, &uuid));
        Ok(uuid)
    }

    /// Applies posted values to one entry; `false` when the id is absent.
    pub fn set_entry(&mut self, reference: &Reference, values: &Map<String, Value>) -> Result<bool> {
        let def = self.collection_def(reference.collection())?.clone();
        match tree::resolve_reference_mut(&mut self.root, reference)? {
            Some(entry) => {
                apply(def.children(), entry, values);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sets one leaf of an entry; `false` when the id is absent.
    pub fn set_entry_field(&mut self, reference: &Reference, field: &str, value: &str) -> Result<bool> {
        self.collection_def(reference.collection())?;
        match tree::resolve_reference_mut(&mut self.root, reference)? {
            Some(entry) => {
                entry.set_field(field, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes one entry; `false` when the id is absent.
    pub fn del(&mut self, reference: &Reference) -> Result<bool> {
        self.collection_def(reference.collection())?;
        let (parent, name) = tree::resolve_collection_parent_mut(&mut self.root, reference.collection())?;
        Ok(parent.remove_entry(name, reference.uuid()))
    }

    /// Runs the field validators and uniqueness constraints of every field
    /// changed since load. New entries count as changed.
    ///
    /// Field references are relative to the model root, with entry ids in
    /// place, e.g. `servers.server.<uuid>.name`.
    pub fn validate(&self, resolver: &RelationResolver<'_>) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();
        validate_fields(
            &self.schema.fields,
            &self.root,
            Some(&self.loaded),
            &PathBuf::new(),
            resolver,
            &mut messages,
        );
        messages
    }

    /// Grid rows for the collection at `path`, with display descriptions.
    pub fn records(&self, path: &PathBuf, resolver: &RelationResolver<'_>) -> Result<Vec<GridRecord>> {
        let def = self.collection_def(path)?;
        let entries = tree::resolve_collection(&self.root, path)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let uuid = entry.uuid()?;
                let mut record = GridRecord::new(uuid);
                collect_leaves(def.children(), entry, &PathBuf::new(), &mut |name, field, value| {
                    record.insert(name, value, describe(field, value, resolver));
                });
                Some(record)
            })
            .collect())
    }

    /// Renders the selectable options of a field with its current value marked.
    ///
    /// `field` is model-relative; entry ids inside it are skipped.
    pub fn field_options(
        &self,
        field: &PathBuf,
        value: &str,
        resolver: &RelationResolver<'_>,
    ) -> Result<Vec<OptionData>> {
        let def = self
            .schema
            .field_at(field)
            .ok_or_else(|| ModelError::FieldNotFound {
                path: field.to_string(),
            })?;
        let selected: Vec<&str> = split_values(value).collect();
        match &def.kind {
            FieldKind::Option { options, .. } => Ok(relation::render(
                options.iter().map(|c| (c.value.as_str(), c.label.as_str())),
                &selected,
                false,
            )),
            FieldKind::Relation(rel) => {
                let options = resolver.options(rel);
                Ok(relation::render(options.iter(), &selected, rel.preserve_order))
            }
            _ => Err(ModelError::NotSelectable {
                path: field.to_string(),
            }
            .into()),
        }
    }

    /// Current text of a leaf addressed by a model-relative path.
    pub fn value_at(&self, path: &PathBuf) -> Option<&str> {
        let mut current = &self.root;
        let mut steps = path.components().peekable();
        let mut fields: &[FieldDef] = &self.schema.fields;
        while let Some(step) = steps.next() {
            let def = fields.iter().find(|f| f.name == step)?;
            if def.is_leaf() {
                return steps.peek().is_none().then(|| current.field(step)).flatten();
            }
            current = if def.is_array() {
                current.entry(step, steps.next()?)?
            } else {
                current.first_child(step)?
            };
            fields = def.children();
        }
        None
    }
}

/// Fills in defaults, containers and entry ids below `element`.
fn normalize(fields: &[FieldDef], element: &mut Element) {
    for def in fields {
        match &def.kind {
            FieldKind::Container { fields } => normalize(fields, element.ensure_child(&def.name)),
            FieldKind::Array { fields } => {
                for entry in element
                    .children_mut()
                    .iter_mut()
                    .filter(|c| c.name() == def.name)
                {
                    if entry.uuid().is_none() {
                        entry.set_attribute(UUID_ATTR, Uuid::new_v4().to_string());
                    }
                    normalize(fields, entry);
                }
            }
            _ => {
                if element.first_child(&def.name).is_none() {
                    element.push_child(Element::leaf(&def.name, def.initial_value()));
                }
            }
        }
    }
}

fn new_entry(def: &FieldDef, uuid: &str) -> Element {
    let mut entry = Element::new(&def.name).with_attribute(UUID_ATTR, uuid);
    normalize(def.children(), &mut entry);
    entry
}

fn nodes_of(fields: &[FieldDef], element: &Element) -> Map<String, Value> {
    let mut nodes = Map::new();
    for def in fields {
        let value = match &def.kind {
            FieldKind::Container { fields } => Value::Object(
                element
                    .first_child(&def.name)
                    .map(|child| nodes_of(fields, child))
                    .unwrap_or_default(),
            ),
            FieldKind::Array { fields } => Value::Object(
                element
                    .children_named(&def.name)
                    .filter_map(|entry| {
                        Some((entry.uuid()?.to_string(), Value::Object(nodes_of(fields, entry))))
                    })
                    .collect(),
            ),
            _ => Value::String(element.field(&def.name).unwrap_or_default().to_string()),
        };
        nodes.insert(def.name.clone(), value);
    }
    nodes
}

/// Converts a posted scalar into stored text; `None` leaves the field as is.
fn posted_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { TRUE_TOKEN } else { FALSE_TOKEN }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(items) => {
            let separator = LIST_SEPARATOR.to_string();
            Some(
                items
                    .iter()
                    .filter_map(posted_text)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(separator.as_str()),
            )
        }
        Value::Object(_) => None,
    }
}

fn apply(fields: &[FieldDef], element: &mut Element, values: &Map<String, Value>) {
    for (key, value) in values {
        let Some(def) = fields.iter().find(|f| f.name == *key) else {
            continue;
        };
        match (&def.kind, value) {
            (FieldKind::Container { fields }, Value::Object(values)) => {
                apply(fields, element.ensure_child(&def.name), values);
            }
            (FieldKind::Array { .. }, Value::Object(entries)) => {
                for (posted_id, values) in entries {
                    let Value::Object(values) = values else {
                        continue;
                    };
                    // Unknown ids get a fresh one so ids stay unique across the document.
                    let uuid = if element.entry(&def.name, posted_id).is_some() {
                        posted_id.clone()
                    } else {
                        let uuid = Uuid::new_v4().to_string();
                        element.push_child(new_entry(def, &uuid));
                        uuid
                    };
                    if let Some(entry) = element.entry_mut(&def.name, &uuid) {
                        apply(def.children(), entry, values);
                    }
                }
            }
            (FieldKind::Container { .. } | FieldKind::Array { .. }, _) => {}
            (_, value) => {
                if let Some(text) = posted_text(value) {
                    element.set_field(&def.name, text);
                }
            }
        }
    }
}

fn split_values(value: &str) -> impl Iterator<Item = &str> {
    value.split(LIST_SEPARATOR).filter(|v| !v.is_empty())
}

/// Returns the violation message for a leaf value, if any.
fn check_leaf(def: &FieldDef, value: &str, resolver: &RelationResolver<'_>) -> Option<String> {
    if value.is_empty() {
        return def.required.then(|| REQUIRED_MESSAGE.to_string());
    }
    let violation = match &def.kind {
        FieldKind::Text { mask } => mask
            .as_ref()
            .filter(|mask| !mask.is_match(value))
            .map(|_| "Please specify a valid value.".to_string()),
        FieldKind::Boolean => (value != TRUE_TOKEN && value != FALSE_TOKEN)
            .then(|| "Value should be a boolean (0,1).".to_string()),
        FieldKind::Integer { min, max } => match value.parse::<i64>() {
            Err(_) => Some("Value should be an integer.".to_string()),
            Ok(n) => match (min, max) {
                (Some(lo), Some(hi)) if n < *lo || n > *hi => {
                    Some(format!("Value should be between {lo} and {hi}."))
                }
                (Some(lo), None) if n < *lo => Some(format!("Value should be at least {lo}.")),
                (None, Some(hi)) if n > *hi => Some(format!("Value should be at most {hi}.")),
                _ => None,
            },
        },
        FieldKind::Option { options, multiple } => {
            let mut chosen = split_values(value);
            let single_ok = *multiple || value.split(LIST_SEPARATOR).count() == 1;
            let known = chosen.all(|v| options.iter().any(|c| c.value == v));
            (!(single_ok && known)).then(|| "Option not in list.".to_string())
        }
        FieldKind::Relation(rel) => {
            let single_ok = rel.multiple || value.split(LIST_SEPARATOR).count() == 1;
            let options = resolver.options(rel);
            let known = split_values(value).all(|id| options.contains(id));
            (!(single_ok && known)).then(|| "Related item not found.".to_string())
        }
        FieldKind::Container { .. } | FieldKind::Array { .. } => None,
    };
    violation.map(|default| def.message.clone().unwrap_or(default))
}

fn validate_fields(
    fields: &[FieldDef],
    element: &Element,
    original: Option<&Element>,
    prefix: &PathBuf,
    resolver: &RelationResolver<'_>,
    messages: &mut Vec<ValidationMessage>,
) {
    for def in fields {
        let path = prefix.clone().push(&def.name);
        match &def.kind {
            FieldKind::Container { fields } => {
                if let Some(child) = element.first_child(&def.name) {
                    let original = original.and_then(|o| o.first_child(&def.name));
                    validate_fields(fields, child, original, &path, resolver, messages);
                }
            }
            FieldKind::Array { fields } => {
                let entries: Vec<&Element> = element.children_named(&def.name).collect();
                for entry in &entries {
                    let uuid = entry.uuid().unwrap_or_default();
                    let original = original.and_then(|o| o.entry(&def.name, uuid));
                    let entry_path = path.clone().push(uuid);
                    validate_fields(fields, entry, original, &entry_path, resolver, messages);
                }
                check_unique(def, &entries, original, &path, messages);
            }
            _ => {
                let value = element.field(&def.name).unwrap_or_default();
                if !is_changed(original, &def.name, value) {
                    continue;
                }
                if let Some(message) = check_leaf(def, value, resolver) {
                    messages.push(ValidationMessage::new(path.as_str(), message));
                }
            }
        }
    }
}

fn is_changed(original: Option<&Element>, field: &str, value: &str) -> bool {
    original.and_then(|o| o.field(field)) != Some(value)
}

fn check_unique(
    array: &FieldDef,
    entries: &[&Element],
    original: Option<&Element>,
    collection: &PathBuf,
    messages: &mut Vec<ValidationMessage>,
) {
    for def in array.children().iter().filter(|f| f.unique && f.is_leaf()) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in entries {
            let value = entry.field(&def.name).unwrap_or_default();
            if !value.is_empty() {
                *counts.entry(value).or_default() += 1;
            }
        }
        for entry in entries {
            let value = entry.field(&def.name).unwrap_or_default();
            let uuid = entry.uuid().unwrap_or_default();
            let before = original.and_then(|o| o.entry(&array.name, uuid));
            if counts.get(value).is_some_and(|&n| n > 1) && is_changed(before, &def.name, value) {
                let path = collection.clone().push(uuid).push(&def.name);
                messages.push(ValidationMessage::new(path.as_str(), UNIQUE_MESSAGE));
            }
        }
    }
}

fn collect_leaves(
    fields: &[FieldDef],
    element: &Element,
    prefix: &PathBuf,
    visit: &mut dyn FnMut(String, &FieldDef, &str),
) {
    for def in fields {
        match &def.kind {
            FieldKind::Container { fields } => {
                if let Some(child) = element.first_child(&def.name) {
                    collect_leaves(fields, child, &prefix.clone().push(&def.name), visit);
                }
            }
            FieldKind::Array { .. } => {}
            _ => {
                let value = element.field(&def.name).unwrap_or_default();
                visit(prefix.clone().push(&def.name).to_string(), def, value);
            }
        }
    }
}

/// Human readable form of a stored value: option and relation ids become labels.
pub fn describe(def: &FieldDef, value: &str, resolver: &RelationResolver<'_>) -> String {
    match &def.kind {
        FieldKind::Option { options, .. } => split_values(value)
            .filter_map(|v| options.iter().find(|c| c.value == v))
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        FieldKind::Relation(rel) => {
            let options = resolver.options(rel);
            split_values(value)
                .filter_map(|id| options.get(id))
                .collect::<Vec<_>>()
                .join(", ")
        }
        _ => value.to_string(),
    }
}
