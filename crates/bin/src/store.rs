//! Opening the document and model registry named on the command line.

use std::{error::Error, fs, sync::Arc};

use confmodel::{
    config::{Config, Settings},
    controller::{ModelController, Principal, Request},
    model::ModelRegistry,
    relation::OptionCache,
    storage::JsonFile,
};
use serde_json::{Map, Value};

use crate::cli::{ModelArgs, StoreArgs};

/// Everything a command needs to build controllers.
pub struct Workspace {
    config: Arc<Config>,
    registry: Arc<ModelRegistry>,
    cache: Arc<OptionCache>,
    settings: Settings,
    principal: Principal,
}

impl Workspace {
    pub fn open(args: &StoreArgs) -> Result<Self, Box<dyn Error>> {
        let settings = match &args.settings {
            Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
            None => Settings::default(),
        };
        let registry = load_registry(args)?;

        tracing::debug!("Opening configuration at {}", args.config.display());
        let config = Config::open(Arc::new(JsonFile::new(&args.config)))?;

        let mut principal = Principal::new(args.user.as_str());
        if args.readonly {
            principal = principal.with_privilege(settings.readonly_privilege.as_str());
        }

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            cache: Arc::new(OptionCache::new()),
            settings,
            principal,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn controller(&self, args: &ModelArgs) -> Result<ModelController, Box<dyn Error>> {
        let name = args.name.clone().unwrap_or_else(|| default_name(&args.model));
        let controller = ModelController::new(
            Arc::clone(&self.config),
            Arc::clone(&self.registry),
            Arc::clone(&self.cache),
            args.model.as_str(),
            name,
        )?;
        Ok(controller.with_settings(self.settings.clone()))
    }

    pub fn read(&self) -> Request {
        Request::get(self.principal.clone())
    }

    /// A write request posting `values` under `group`.
    pub fn write(&self, group: &str, values: Option<&str>) -> Result<Request, Box<dyn Error>> {
        let mut params = Map::new();
        if let Some(values) = values {
            params.insert(group.to_string(), parse_object(values)?);
        }
        Ok(Request::post(self.principal.clone(), params))
    }
}

/// Lowercased last segment of a model id.
fn default_name(model: &str) -> String {
    model
        .rsplit('.')
        .next()
        .unwrap_or(model)
        .to_lowercase()
}

/// Last segment of a collection path, used as the posted group name.
pub fn key_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn parse_object(json: &str) -> Result<Value, Box<dyn Error>> {
    match serde_json::from_str(json)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err("values must be a JSON object".into()),
    }
}

fn load_registry(args: &StoreArgs) -> Result<ModelRegistry, Box<dyn Error>> {
    let mut registry = ModelRegistry::new();
    if !args.models.is_dir() {
        tracing::warn!("Model directory {} not found", args.models.display());
        return Ok(registry);
    }

    let mut paths: Vec<_> = fs::read_dir(&args.models)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let json = fs::read_to_string(&path)?;
        match registry.register_json(&json) {
            Ok(id) => tracing::debug!("Registered model {id} from {}", path.display()),
            Err(e) => return Err(format!("Invalid model definition {}: {e}", path.display()).into()),
        }
    }
    Ok(registry)
}
