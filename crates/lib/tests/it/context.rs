//! Test context wiring a configuration, registry and option cache together.

use std::sync::Arc;

use confmodel::{
    config::Config,
    controller::ModelController,
    model::ModelRegistry,
    relation::OptionCache,
    storage::InMemory,
    tree::Element,
};
use serde_json::json;

use crate::helpers::{ALIAS, ALIASES, DNSCRYPT, FILTER, RULES, SERVERS, post, registry};

/// Everything a controller needs, with the storage kept inspectable.
pub struct TestContext {
    pub storage: Arc<InMemory>,
    pub config: Arc<Config>,
    pub registry: Arc<ModelRegistry>,
    pub cache: Arc<OptionCache>,
}

impl TestContext {
    /// Create a context over an empty document.
    pub fn new() -> Self {
        Self::with_storage(InMemory::new())
    }

    /// Create a context whose storage already holds `document`.
    pub fn with_document(document: Element) -> Self {
        Self::with_storage(InMemory::with_document(document))
    }

    fn with_storage(storage: InMemory) -> Self {
        let storage = Arc::new(storage);
        let config = Config::open(storage.clone()).expect("Failed to open config");
        Self {
            storage,
            config: Arc::new(config),
            registry: Arc::new(registry()),
            cache: Arc::new(OptionCache::new()),
        }
    }

    pub fn controller(&self, model_id: &str, model_name: &str) -> ModelController {
        ModelController::new(
            self.config.clone(),
            self.registry.clone(),
            self.cache.clone(),
            model_id,
            model_name,
        )
        .expect("Failed to create controller")
    }

    pub fn dnscrypt(&self) -> ModelController {
        self.controller(DNSCRYPT, "dnscrypt")
            .with_grid_target(SERVERS, ["enabled", "name", "address", "proto"])
    }

    pub fn aliases(&self) -> ModelController {
        self.controller(ALIAS, "alias").with_safe_delete(true)
    }

    pub fn rules(&self) -> ModelController {
        self.controller(FILTER, "filter")
    }

    /// Number of documents written to storage so far.
    pub fn commits(&self) -> usize {
        self.storage.commits()
    }

    pub fn document(&self) -> Element {
        self.config.snapshot()
    }

    pub fn add_server(&self, name: &str) -> String {
        let response = self
            .dnscrypt()
            .add_base(&post(json!({"server": {"name": name}})), "server", SERVERS, None)
            .expect("Failed to add server");
        response.uuid.expect("server not saved")
    }

    pub fn add_alias(&self, name: &str, alias_type: &str) -> String {
        let response = self
            .aliases()
            .add_base(
                &post(json!({"alias": {"name": name, "type": alias_type}})),
                "alias",
                ALIASES,
                None,
            )
            .expect("Failed to add alias");
        response.uuid.expect("alias not saved")
    }

    pub fn add_rule(&self, fields: serde_json::Value) -> String {
        let response = self
            .rules()
            .add_base(&post(json!({ "rule": fields })), "rule", RULES, None)
            .expect("Failed to add rule");
        response.uuid.expect("rule not saved")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
