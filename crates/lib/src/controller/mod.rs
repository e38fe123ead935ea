//! Uniform operations over one registered model.
//!
//! A [`ModelController`] binds a model id to an external name and exposes the
//! get/add/set/delete/toggle/search operations on its collections, the
//! whole-model settings API and the grid action router. Every mutation runs
//! on a working copy: posted values are applied, the copy is validated, and
//! only a valid copy is committed under the configuration write lock.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use confmodel::{
//!     config::Config,
//!     controller::{ModelController, Principal, Request},
//!     model::ModelRegistry,
//!     relation::OptionCache,
//!     schema::{FieldDef, Schema},
//!     storage::InMemory,
//! };
//! use serde_json::json;
//!
//! let mut registry = ModelRegistry::new();
//! registry.register_schema(
//!     Schema::new("Demo.Hosts", "Demo.hosts", "1.0.0").field(FieldDef::container(
//!         "hosts",
//!         vec![FieldDef::array(
//!             "host",
//!             vec![
//!                 FieldDef::boolean("enabled").default_value("1"),
//!                 FieldDef::text("name").required(),
//!             ],
//!         )],
//!     )),
//! );
//!
//! let config = Arc::new(Config::open(Arc::new(InMemory::new()))?);
//! let controller = ModelController::new(
//!     config,
//!     Arc::new(registry),
//!     Arc::new(OptionCache::new()),
//!     "Demo.Hosts",
//!     "hosts",
//! )?;
//!
//! let admin = Principal::new("root");
//! let request = Request::post(admin, json!({"host": {"name": "gw"}}).as_object().unwrap().clone());
//! let added = controller.add_base(&request, "host", "hosts.host", None)?;
//! assert!(added.is_saved());
//!
//! let uuid = added.uuid.unwrap();
//! let fetched = controller.get_base("host", "hosts.host", Some(&uuid))?;
//! assert_eq!(fetched["host"]["name"], "gw");
//! # Ok::<(), confmodel::Error>(())
//! ```

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    Result,
    config::{Config, ConfigLock, Settings},
    constants::{ENABLED_FIELD, FALSE_TOKEN, GRID_ACTIONS, ITEM_IN_USE_TITLE, TRUE_TOKEN},
    grid::{Grid, GridRecord, SearchParams, SearchResponse, SortMode},
    model::{Model, ModelRegistry},
    relation::{OptionCache, OptionData, RelationResolver},
    safe_delete::{ReferenceScanner, TextScanner},
    tree::{Element, PathBuf, Reference},
    validation::{ValidationReport, Validations},
};

pub mod errors;
pub mod request;
pub mod response;

pub use errors::ControllerError;
pub use request::{Method, Principal, Request};
pub use response::{
    DeleteResponse, DeleteResult, SaveResponse, SaveResult, ToggleResponse, ToggleResult,
};

/// Runs after a settings update validated and before it is saved.
pub trait SettingsHook: Send + Sync + fmt::Debug {
    /// Returns a message to veto the save.
    fn before_save(&self, model: &Model) -> Option<String>;
}

/// What an edit of a working copy asks for.
enum Edit<T> {
    /// Leave the document alone and report `T`.
    Skip(T),
    /// Validate and commit the copy; `node_ref` scopes the validation paths.
    Commit { value: T, node_ref: Option<String> },
}

/// Outcome of [`ModelController::apply_edit`].
enum Applied<T> {
    Saved(T),
    Skipped(T),
    Invalid(ValidationReport),
    Vetoed(String),
}

/// Operations over one model.
#[derive(Debug, Clone)]
pub struct ModelController {
    config: Arc<Config>,
    registry: Arc<ModelRegistry>,
    cache: Arc<OptionCache>,
    model_id: String,
    model_name: String,
    safe_delete: bool,
    scanner: Arc<dyn ReferenceScanner>,
    grid_targets: BTreeMap<String, Vec<String>>,
    settings: Settings,
    hook: Option<Arc<dyn SettingsHook>>,
}

impl ModelController {
    /// Binds `model_id` under the external name `model_name`.
    pub fn new(
        config: Arc<Config>,
        registry: Arc<ModelRegistry>,
        cache: Arc<OptionCache>,
        model_id: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Result<Self> {
        let model_id = model_id.into();
        let model_name = model_name.into();
        if model_name.is_empty() {
            return Err(ControllerError::MissingModelName.into());
        }
        registry.schema(&model_id)?;
        Ok(Self {
            config,
            registry,
            cache,
            model_id,
            model_name,
            safe_delete: false,
            scanner: Arc::new(TextScanner),
            grid_targets: BTreeMap::new(),
            settings: Settings::default(),
            hook: None,
        })
    }

    /// Refuse deletes of entries that are still referenced.
    pub fn with_safe_delete(mut self, enabled: bool) -> Self {
        self.safe_delete = enabled;
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn ReferenceScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Allows `search` through [`ModelController::dispatch`] on `target`.
    pub fn with_grid_target<I, S>(mut self, target: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grid_targets
            .insert(target.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn SettingsHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// A fresh working copy of the bound model.
    pub fn model(&self) -> Result<Model> {
        let schema = self.registry.schema(&self.model_id)?;
        Ok(self.config.load_model(schema))
    }

    /// Validates `model` and rewrites field paths relative to `prefix`.
    ///
    /// `prefix` defaults to the model name. With `node_ref`, that path inside
    /// each field path is replaced by the prefix.
    pub fn validate(&self, model: &Model, node_ref: Option<&str>, prefix: Option<&str>) -> ValidationReport {
        let document = self.config.read();
        self.validate_against(&document, model, node_ref, prefix)
    }

    fn validate_against(
        &self,
        document: &Element,
        model: &Model,
        node_ref: Option<&str>,
        prefix: Option<&str>,
    ) -> ValidationReport {
        let resolver = RelationResolver::new(&self.registry, document, &self.cache)
            .with_own_model(model.id(), model.root());
        let messages = model.validate(&resolver);
        let prefix = prefix
            .filter(|p| !p.is_empty())
            .unwrap_or(self.model_name.as_str());
        ValidationReport::new(Validations::aggregate(&messages, node_ref, prefix))
    }

    /// Commits `model` unless the principal is read-only.
    ///
    /// Fails with a conflict when another commit landed after `model` was
    /// loaded.
    pub fn save(&self, request: &Request, model: &Model) -> Result<SaveResponse> {
        self.check_write_access(request)?;
        let mut lock = self.config.lock();
        self.commit(&mut lock, model)?;
        Ok(SaveResponse::saved())
    }

    /// Commits under the held lock and drops option sets read from this model.
    fn commit(&self, lock: &mut ConfigLock<'_>, model: &Model) -> Result<()> {
        lock.commit_model(model)?;
        self.cache.invalidate_model(model.id());
        Ok(())
    }

    fn check_write_access(&self, request: &Request) -> Result<()> {
        let privilege = &self.settings.readonly_privilege;
        if request.principal.has_privilege(privilege) {
            warn!(user = %request.principal.name, model = %self.model_id, "Write access denied");
            return Err(ControllerError::WriteAccessDenied {
                user: request.principal.name.clone(),
                privilege: privilege.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Applies `edit` to a working copy, validates it and commits it.
    ///
    /// `edit` first runs on a snapshot, which is validated and offered to
    /// `hook` without holding the write lock. If another commit lands before
    /// the lock is taken, `edit` runs again on the locked document and that
    /// copy is validated again before it is committed.
    fn apply_edit<T>(
        &self,
        request: &Request,
        prefix: Option<&str>,
        hook: Option<&dyn SettingsHook>,
        edit: impl Fn(&mut Model) -> Result<Edit<T>>,
    ) -> Result<Applied<T>> {
        let schema = self.registry.schema(&self.model_id)?;
        let mut model = self.config.load_model(Arc::clone(&schema));
        let (mut value, node_ref) = match edit(&mut model)? {
            Edit::Skip(value) => return Ok(Applied::Skipped(value)),
            Edit::Commit { value, node_ref } => (value, node_ref),
        };
        let report = self.validate(&model, node_ref.as_deref(), prefix);
        if !report.is_valid() {
            return Ok(Applied::Invalid(report));
        }
        if let Some(hook) = hook
            && let Some(error) = hook.before_save(&model).filter(|e| !e.is_empty())
        {
            debug!(model = %self.model_id, error = %error, "Settings hook vetoed save");
            return Ok(Applied::Vetoed(error));
        }
        self.check_write_access(request)?;

        let mut lock = self.config.lock();
        if model.generation() != Some(lock.generation()) {
            debug!(model = %self.model_id, generation = lock.generation(), "Document changed, reapplying edit");
            model = lock.load_model(schema);
            let node_ref = match edit(&mut model)? {
                Edit::Skip(value) => return Ok(Applied::Skipped(value)),
                Edit::Commit { value: again, node_ref } => {
                    value = again;
                    node_ref
                }
            };
            let report = self.validate_against(lock.document(), &model, node_ref.as_deref(), prefix);
            if !report.is_valid() {
                return Ok(Applied::Invalid(report));
            }
        }
        self.commit(&mut lock, &model)?;
        Ok(Applied::Saved(value))
    }

    /// Validates, then saves; echoes the id of `reference` on success.
    pub fn validate_and_save(
        &self,
        request: &Request,
        model: &Model,
        reference: Option<&Reference>,
        prefix: Option<&str>,
    ) -> Result<SaveResponse> {
        let node_ref = reference.map(ToString::to_string);
        let report = self.validate(model, node_ref.as_deref(), prefix);
        if !report.is_valid() {
            return Ok(SaveResponse::invalid(report.validations));
        }
        let response = self.save(request, model)?;
        Ok(match reference {
            Some(reference) => response.with_uuid(reference.uuid()),
            None => response,
        })
    }

    /// All model values under the model name; empty unless a read request.
    pub fn get_settings(&self, request: &Request) -> Result<Map<String, Value>> {
        let mut result = Map::new();
        if request.is_get() {
            result.insert(self.model_name.clone(), self.model()?.get_nodes());
        }
        Ok(result)
    }

    /// Applies the posted group named after the model to the whole model.
    ///
    /// The hook sees the copy built from the snapshot.
    pub fn set_settings(&self, request: &Request) -> Result<SaveResponse> {
        if !request.is_post() {
            return Ok(SaveResponse::failed());
        }
        let posted = request.posted(&self.model_name).cloned().map(Value::Object);
        let outcome = self.apply_edit(request, None, self.hook.as_deref(), |model| {
            if let Some(posted) = &posted {
                model.set_nodes(posted);
            }
            Ok(Edit::Commit {
                value: (),
                node_ref: None,
            })
        })?;
        Ok(match outcome {
            Applied::Saved(()) => SaveResponse::saved(),
            Applied::Skipped(()) => SaveResponse::failed(),
            Applied::Invalid(report) => SaveResponse::invalid(report.validations),
            Applied::Vetoed(error) => SaveResponse::rejected(error),
        })
    }

    /// One entry's values under `key_name`, or a fresh unsaved entry's when
    /// `uuid` is `None`. An unknown id yields an empty map.
    pub fn get_base(&self, key_name: &str, path: &str, uuid: Option<&str>) -> Result<Map<String, Value>> {
        let model = self.model()?;
        let path = PathBuf::from(path);
        let nodes = match uuid {
            Some(uuid) => model.entry_nodes(&Reference::new(path, uuid))?,
            None => Some(model.default_entry(&path)?),
        };
        let mut result = Map::new();
        if let Some(nodes) = nodes {
            result.insert(key_name.to_string(), Value::Object(nodes));
        }
        Ok(result)
    }

    /// Adds an entry from the posted group `post_field`, then `overlay`.
    pub fn add_base(
        &self,
        request: &Request,
        post_field: &str,
        path: &str,
        overlay: Option<&Map<String, Value>>,
    ) -> Result<SaveResponse> {
        let Some(posted) = request.posted(post_field) else {
            return Ok(SaveResponse::failed());
        };
        let path = PathBuf::from(path);
        let outcome = self.apply_edit(request, Some(post_field), None, |model| {
            let uuid = model.add(&path)?;
            let reference = Reference::new(path.clone(), uuid.as_str());
            model.set_entry(&reference, posted)?;
            if let Some(overlay) = overlay {
                model.set_entry(&reference, overlay)?;
            }
            Ok(Edit::Commit {
                node_ref: Some(reference.to_string()),
                value: uuid,
            })
        })?;

        Ok(match outcome {
            Applied::Saved(uuid) => {
                info!(model = %self.model_id, uuid = %uuid, "Entry added");
                SaveResponse::saved().with_uuid(&uuid)
            }
            Applied::Invalid(report) => SaveResponse::invalid(report.validations),
            Applied::Skipped(_) => SaveResponse::failed(),
            Applied::Vetoed(error) => SaveResponse::rejected(error),
        })
    }

    /// Updates an entry from the posted group `post_field`, then `overlay`.
    pub fn set_base(
        &self,
        request: &Request,
        post_field: &str,
        path: &str,
        uuid: &str,
        overlay: Option<&Map<String, Value>>,
    ) -> Result<SaveResponse> {
        let Some(posted) = request.posted(post_field) else {
            return Ok(SaveResponse::failed());
        };
        let reference = Reference::new(path, uuid);
        let outcome = self.apply_edit(request, Some(post_field), None, |model| {
            if !model.set_entry(&reference, posted)? {
                return Ok(Edit::Skip(()));
            }
            if let Some(overlay) = overlay {
                model.set_entry(&reference, overlay)?;
            }
            Ok(Edit::Commit {
                value: (),
                node_ref: Some(reference.to_string()),
            })
        })?;

        Ok(match outcome {
            Applied::Saved(()) => SaveResponse::saved(),
            Applied::Invalid(report) => SaveResponse::invalid(report.validations),
            Applied::Skipped(()) => SaveResponse::failed(),
            Applied::Vetoed(error) => SaveResponse::rejected(error),
        })
    }

    /// Removes an entry, refusing when safe delete finds references to it.
    pub fn del_base(&self, request: &Request, path: &str, uuid: &str) -> Result<DeleteResponse> {
        if !request.is_post() {
            return Ok(DeleteResponse::new(DeleteResult::Failed));
        }
        let schema = self.registry.schema(&self.model_id)?;
        let reference = Reference::new(path, uuid);

        let mut lock = self.config.lock();
        if self.safe_delete {
            let usages = self.scanner.find_usages(lock.document(), uuid);
            if !usages.is_empty() {
                warn!(model = %self.model_id, uuid = %uuid, usages = usages.len(), "Delete blocked by references");
                return Err(ControllerError::SafeDeleteBlocked {
                    title: ITEM_IN_USE_TITLE.to_string(),
                    usages,
                }
                .into());
            }
        }

        let mut model = lock.load_model(schema);
        if !model.del(&reference)? {
            return Ok(DeleteResponse::new(DeleteResult::NotFound));
        }
        self.check_write_access(request)?;
        self.commit(&mut lock, &model)?;
        info!(model = %self.model_id, uuid = %uuid, "Entry deleted");
        Ok(DeleteResponse::new(DeleteResult::Deleted))
    }

    /// Sets or flips the `enabled` flag of an entry.
    ///
    /// `desired` must be `"0"` or `"1"`; any other non-empty value fails with
    /// `changed = false`. `None` or an empty value flips the flag. The model
    /// is only saved when the flag changed.
    pub fn toggle_base(
        &self,
        request: &Request,
        path: &str,
        uuid: &str,
        desired: Option<&str>,
    ) -> Result<ToggleResponse> {
        if !request.is_post() {
            return Ok(ToggleResponse::failed());
        }
        let desired = desired.filter(|d| !d.is_empty());
        if desired.is_some_and(|d| d != TRUE_TOKEN && d != FALSE_TOKEN) {
            return Ok(ToggleResponse {
                result: ToggleResult::Failed,
                changed: Some(false),
            });
        }
        let reference = Reference::new(path, uuid);
        let outcome = self.apply_edit(request, None, None, |model| {
            let Some(current) = model
                .entry(&reference)?
                .map(|entry| entry.field(ENABLED_FIELD).unwrap_or_default().to_string())
            else {
                return Ok(Edit::Skip(ToggleResult::Failed));
            };
            let target = match desired {
                Some(d) => d,
                None if current == TRUE_TOKEN => FALSE_TOKEN,
                None => TRUE_TOKEN,
            };
            let result = if target == TRUE_TOKEN {
                ToggleResult::Enabled
            } else {
                ToggleResult::Disabled
            };
            if current == target {
                return Ok(Edit::Skip(result));
            }
            model.set_entry_field(&reference, ENABLED_FIELD, target)?;
            Ok(Edit::Commit {
                value: result,
                node_ref: Some(reference.to_string()),
            })
        })?;

        Ok(match outcome {
            Applied::Saved(result) => ToggleResponse {
                result,
                changed: Some(true),
            },
            Applied::Skipped(ToggleResult::Failed) => ToggleResponse::failed(),
            Applied::Skipped(result) => ToggleResponse {
                result,
                changed: Some(false),
            },
            Applied::Invalid(_) | Applied::Vetoed(_) => {
                debug!(model = %self.model_id, uuid = %uuid, "Toggle left entry invalid");
                ToggleResponse {
                    result: ToggleResult::Failed,
                    changed: Some(false),
                }
            }
        })
    }

    /// One page of the collection at `path`, exposing `fields`.
    ///
    /// Paging, sorting and filters come from the request parameters.
    /// `sort_mode` defaults to the configured one.
    pub fn search_base(
        &self,
        request: &Request,
        path: &str,
        fields: &[&str],
        default_sort: Option<&str>,
        filter: Option<&dyn Fn(&GridRecord) -> bool>,
        sort_mode: Option<SortMode>,
    ) -> Result<SearchResponse> {
        let params = SearchParams::from_params(&request.params);
        let model = self.model()?;
        let records = {
            let document = self.config.read();
            let resolver = RelationResolver::new(&self.registry, &document, &self.cache)
                .with_own_model(model.id(), model.root());
            model.records(&PathBuf::from(path), &resolver)?
        };

        let mut grid = Grid::new(fields.iter().copied())
            .sort_mode(sort_mode.unwrap_or(self.settings.sort_mode))
            .default_row_count(self.settings.default_row_count);
        if let Some(field) = default_sort {
            grid = grid.default_sort(field);
        }
        if let Some(filter) = filter {
            grid = grid.filter(filter);
        }
        Ok(grid.fetch(records, &params))
    }

    /// Options of a selection field with the current value marked.
    ///
    /// `path` addresses a collection (with `uuid`) or a container; `field`
    /// is relative to it. Without `uuid` the field's default is marked.
    /// `None` when `uuid` names no entry.
    pub fn options(&self, path: &str, field: &str, uuid: Option<&str>) -> Result<Option<Vec<OptionData>>> {
        let model = self.model()?;
        let base = PathBuf::from(path);
        let field_path = match uuid {
            Some(uuid) => {
                let reference = Reference::new(base.clone(), uuid);
                if model.entry(&reference)?.is_none() {
                    return Ok(None);
                }
                reference.to_path().push(field)
            }
            None => base.push(field),
        };
        let value = match model.value_at(&field_path) {
            Some(value) => value.to_string(),
            None => model
                .schema()
                .field_at(&field_path)
                .map(|def| def.initial_value())
                .unwrap_or_default(),
        };

        let document = self.config.read();
        let resolver = RelationResolver::new(&self.registry, &document, &self.cache)
            .with_own_model(model.id(), model.root());
        Ok(Some(model.field_options(&field_path, &value, &resolver)?))
    }

    /// Routes a grid action on `target` to the matching operation.
    ///
    /// Unknown actions, missing parameters and unknown paths produce the
    /// empty failed grid shape with a message.
    pub fn dispatch(
        &self,
        request: &Request,
        action: &str,
        target: &str,
        uuid: Option<&str>,
    ) -> Result<Value> {
        if !GRID_ACTIONS.contains(&action) {
            return Ok(to_value(SearchResponse::failed(format!(
                "Action \"{action}\" not found."
            ))));
        }
        let key_name = PathBuf::from(target)
            .file_name()
            .unwrap_or_default()
            .to_string();

        let outcome = match (action, uuid) {
            ("search", _) if self.grid_targets.contains_key(target) => {
                let columns: Vec<&str> = self.grid_targets[target].iter().map(String::as_str).collect();
                self.search_base(request, target, &columns, None, None, None)
                    .map(to_value)
            }
            ("get", uuid) => self
                .get_base(&key_name, target, uuid)
                .map(Value::Object),
            ("add", _) => self
                .add_base(request, &key_name, target, None)
                .map(to_value),
            ("del", Some(uuid)) => self.del_base(request, target, uuid).map(to_value),
            ("set", Some(uuid)) => self
                .set_base(request, &key_name, target, uuid, None)
                .map(to_value),
            ("toggle", Some(uuid)) => self
                .toggle_base(request, target, uuid, None)
                .map(to_value),
            _ => {
                return Ok(to_value(SearchResponse::failed(format!(
                    "Some parameters were missing for action \"{action}\" on target \"{target}\""
                ))));
            }
        };

        match outcome {
            Err(err) if err.is_path_error() => {
                debug!(action, target, error = %err, "Grid action on unknown path");
                Ok(to_value(SearchResponse::failed(err.to_string())))
            }
            other => other,
        }
    }
}

fn to_value<T: serde::Serialize>(response: T) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
