//! Registry mapping model ids to their definitions.

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::debug;

use super::ModelError;
use crate::schema::{Schema, SchemaError};

/// Trait for types that can be registered in a [`ModelRegistry`].
///
/// # Example
///
/// ```
/// use confmodel::Registered;
///
/// struct Unbound;
///
/// impl Registered for Unbound {
///     fn type_id() -> &'static str {
///         "OPNsense.Unbound"
///     }
/// }
///
/// assert_eq!(Unbound::type_id(), "OPNsense.Unbound");
/// assert!(Unbound::supports_type_id("OPNsense.Unbound"));
/// ```
pub trait Registered {
    /// Returns the unique model identifier.
    fn type_id() -> &'static str;

    /// Check if this type answers to the given identifier.
    fn supports_type_id(type_id: &str) -> bool {
        type_id == Self::type_id()
    }
}

/// A compiled-in model definition.
pub trait ModelDefinition: Registered {
    fn schema() -> Schema;
}

type Constructor = Arc<dyn Fn() -> Schema + Send + Sync>;

/// Maps model ids to schema constructors.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    constructors: HashMap<String, Constructor>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.ids())
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a compiled-in definition under its type id.
    pub fn register<M: ModelDefinition + 'static>(&mut self) {
        self.register_fn(M::type_id(), M::schema);
    }

    pub fn register_fn<F>(&mut self, id: impl Into<String>, constructor: F)
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        let id = id.into();
        debug!(model = %id, "Registering model");
        self.constructors.insert(id, Arc::new(constructor));
    }

    /// Registers an already built schema under its own id.
    pub fn register_schema(&mut self, schema: Schema) {
        let id = schema.id.clone();
        self.register_fn(id, move || schema.clone());
    }

    /// Parses a JSON definition and registers it; returns the model id.
    pub fn register_json(&mut self, json: &str) -> Result<String, SchemaError> {
        let schema = Schema::from_json(json)?;
        let id = schema.id.clone();
        self.register_schema(schema);
        Ok(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Builds the definition registered under `id`.
    pub fn schema(&self, id: &str) -> Result<Arc<Schema>, ModelError> {
        self.constructors
            .get(id)
            .map(|constructor| Arc::new(constructor()))
            .ok_or_else(|| ModelError::UnknownModel { id: id.to_string() })
    }
}
