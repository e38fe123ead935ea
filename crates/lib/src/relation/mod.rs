//! Relation fields: selectable options drawn from other configuration entries.
//!
//! A relation field stores the ids of entries living elsewhere in the
//! document (or in its own model). The selectable entries are described by
//! one or more [`DataSource`]s and collected into an [`OptionSet`] by a
//! [`RelationResolver`]. Option sets are shared through an injected
//! [`OptionCache`] keyed by a digest of the descriptors, so identical
//! relation fields only scan the document once.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock},
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    model::ModelRegistry,
    ordering::natural_cmp_ignore_case,
    tree::{self, Element, PathBuf},
};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Describes where the options of a relation field come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Registry id of the model holding the entries.
    pub source: String,
    /// Collection path relative to that model's root, e.g. `aliases.alias`.
    pub items: PathBuf,
    /// Field of each entry used as the option label.
    pub display: String,
    /// Keep only the first entry for each distinct value of this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Field name to regular expression; entries must match all of them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl DataSource {
    pub fn new(
        source: impl Into<String>,
        items: impl Into<PathBuf>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            items: items.into(),
            display: display.into(),
            group: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group = Some(field.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.insert(field.into(), pattern.into());
        self
    }
}

/// Type information of a relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationField {
    pub sources: Vec<DataSource>,
    /// Keep options in scan order and list selected ones first when rendering.
    #[serde(default, skip_serializing_if = "is_false")]
    pub preserve_order: bool,
    /// Allow several comma separated ids.
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
}

impl RelationField {
    pub fn new(sources: Vec<DataSource>) -> Self {
        Self {
            sources,
            preserve_order: false,
            multiple: false,
        }
    }

    pub fn preserve_order(mut self) -> Self {
        self.preserve_order = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Deterministic digest of the descriptor set, used as the cache key.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        for source in &self.sources {
            hasher.update(source.source.as_bytes());
            hasher.update([0]);
            hasher.update(source.items.as_str().as_bytes());
            hasher.update([0]);
            hasher.update(source.display.as_bytes());
            hasher.update([0]);
            hasher.update(source.group.as_deref().unwrap_or_default().as_bytes());
            hasher.update([0]);
            for (field, pattern) in &source.filters {
                hasher.update(field.as_bytes());
                hasher.update([b'=']);
                hasher.update(pattern.as_bytes());
                hasher.update([0]);
            }
            hasher.update([1]);
        }
        hasher.update([u8::from(self.preserve_order)]);
        hex::encode(hasher.finalize())
    }
}

/// Ordered `id -> label` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option; an existing id keeps its position and takes the new label.
    pub fn insert(&mut self, id: impl Into<String>, label: impl Into<String>) {
        let id = id.into();
        let label = label.into();
        match self.index.get(&id) {
            Some(&position) => self.entries[position].1 = label,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, label));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(id, label)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, label)| (id.as_str(), label.as_str()))
    }

    /// Case-insensitive natural sort by label.
    pub fn sort_by_label(&mut self) {
        self.entries
            .sort_by(|(_, a), (_, b)| natural_cmp_ignore_case(a, b));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (id, _))| (id.clone(), position))
            .collect();
    }
}

#[derive(Debug)]
struct CachedSet {
    sources: Vec<String>,
    options: Arc<OptionSet>,
}

/// Process-wide store of resolved option sets.
///
/// Each set remembers the model ids it was read from so a commit to one of
/// them can drop it with [`OptionCache::invalidate_model`].
#[derive(Debug, Default)]
pub struct OptionCache {
    sets: RwLock<HashMap<String, CachedSet>>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<OptionSet>> {
        self.sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|cached| Arc::clone(&cached.options))
    }

    /// Stores `options` under `key`, recording the model ids they depend on.
    pub fn insert<I, S>(&self, key: impl Into<String>, sources: I, options: Arc<OptionSet>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cached = CachedSet {
            sources: sources.into_iter().map(Into::into).collect(),
            options,
        };
        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), cached);
    }

    /// Drops one cached set; returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Drops every set read from model `id`; returns how many were dropped.
    pub fn invalidate_model(&self, id: &str) -> usize {
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        let before = sets.len();
        sets.retain(|_, cached| !cached.sources.iter().any(|source| source == id));
        let dropped = before - sets.len();
        if dropped > 0 {
            debug!(model = id, dropped, "Invalidated cached options");
        }
        dropped
    }

    pub fn clear(&self) {
        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.sets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One rendered option of a selection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionData {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Renders options with selection flags.
///
/// With `selected_first`, the selected ids come first in their given order,
/// followed by the remaining options. Selected ids without an option are
/// dropped.
pub fn render<'o>(
    options: impl IntoIterator<Item = (&'o str, &'o str)>,
    selected: &[&str],
    selected_first: bool,
) -> Vec<OptionData> {
    let chosen: HashSet<&str> = selected.iter().copied().collect();
    let options: Vec<(&str, &str)> = options.into_iter().collect();
    let item = |value: &str, label: &str| OptionData {
        value: value.to_string(),
        label: label.to_string(),
        selected: chosen.contains(value),
    };

    if !selected_first {
        return options.iter().map(|(v, l)| item(v, l)).collect();
    }

    let mut rendered = Vec::with_capacity(options.len());
    let mut placed = HashSet::new();
    for id in selected {
        if let Some((value, label)) = options.iter().find(|(v, _)| v == id)
            && placed.insert(*value)
        {
            rendered.push(item(value, label));
        }
    }
    rendered.extend(
        options
            .iter()
            .filter(|(v, _)| !placed.contains(v))
            .map(|(v, l)| item(v, l)),
    );
    rendered
}

/// Builds option sets from the configuration document.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    registry: &'a ModelRegistry,
    document: &'a Element,
    cache: &'a OptionCache,
    own: Option<(&'a str, &'a Element)>,
}

impl<'a> RelationResolver<'a> {
    pub fn new(registry: &'a ModelRegistry, document: &'a Element, cache: &'a OptionCache) -> Self {
        Self {
            registry,
            document,
            cache,
            own: None,
        }
    }

    /// Reads entries of model `id` from `root` instead of the document.
    ///
    /// Used while a model is being edited: sources naming it see the working
    /// copy and are always rescanned.
    pub fn with_own_model(mut self, id: &'a str, root: &'a Element) -> Self {
        self.own = Some((id, root));
        self
    }

    fn is_own(&self, source: &str) -> bool {
        self.own.is_some_and(|(id, _)| id == source)
    }

    /// Option set for `field`, served from the cache when possible.
    ///
    /// Sets read from the working copy of the own model are never cached.
    pub fn options(&self, field: &RelationField) -> Arc<OptionSet> {
        if field.sources.iter().any(|s| self.is_own(&s.source)) {
            debug!("Loading relation options from working copy");
            return Arc::new(self.load(field));
        }

        let key = field.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, options = hit.len(), "Option cache hit");
            return hit;
        }

        debug!(key = %key, "Loading relation options");
        let options = Arc::new(self.load(field));
        let sources = field.sources.iter().map(|s| s.source.as_str());
        self.cache.insert(key, sources, Arc::clone(&options));
        options
    }

    /// Scans every descriptor without consulting the cache.
    pub fn load(&self, field: &RelationField) -> OptionSet {
        let mut options = OptionSet::new();
        for source in &field.sources {
            self.collect(source, &mut options);
        }
        if !field.preserve_order {
            options.sort_by_label();
        }
        options
    }

    fn source_root(&self, source: &str) -> Option<&'a Element> {
        if let Some((id, root)) = self.own
            && id == source
        {
            return Some(root);
        }
        let schema = match self.registry.schema(source) {
            Ok(schema) => schema,
            Err(err) => {
                debug!(source, error = %err, "Skipping unresolvable data source");
                return None;
            }
        };
        match tree::resolve_path(self.document, &schema.mount) {
            Ok(root) => Some(root),
            Err(_) => {
                debug!(source, "Data source has no configuration yet");
                None
            }
        }
    }

    fn collect(&self, source: &DataSource, options: &mut OptionSet) {
        let Some(root) = self.source_root(&source.source) else {
            return;
        };
        let entries = match tree::resolve_collection(root, &source.items) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(source = %source.source, error = %err, "Skipping data source");
                return;
            }
        };

        let mut filters = Vec::with_capacity(source.filters.len());
        for (field, pattern) in &source.filters {
            match Regex::new(pattern) {
                Ok(regex) => filters.push((field.as_str(), regex)),
                Err(err) => {
                    warn!(
                        source = %source.source,
                        field = %field,
                        error = %err,
                        "Invalid relation filter, skipping data source"
                    );
                    return;
                }
            }
        }

        let mut groups = HashSet::new();
        for entry in entries {
            let (Some(uuid), Some(label)) = (entry.uuid(), entry.field(&source.display)) else {
                continue;
            };
            let rejected = filters.iter().any(|(field, regex)| {
                entry
                    .field(field)
                    .is_some_and(|value| !regex.is_match(value))
            });
            if rejected {
                continue;
            }
            if let Some(group) = &source.group {
                match entry.field(group) {
                    Some(value) if groups.insert(value.to_string()) => {}
                    _ => continue,
                }
            }
            options.insert(uuid, label);
        }
    }
}
