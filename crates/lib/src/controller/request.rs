//! The inbound side of an operation: method, principal and parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// The acting user and the privileges they hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub privileges: BTreeSet<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privileges: BTreeSet::new(),
        }
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.insert(privilege.into());
        self
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privileges.contains(privilege)
    }
}

/// One operation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub principal: Principal,
    /// Query or posted parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn get(principal: Principal) -> Self {
        Self {
            method: Method::Get,
            principal,
            params: Map::new(),
        }
    }

    pub fn post(principal: Principal, params: Map<String, Value>) -> Self {
        Self {
            method: Method::Post,
            principal,
            params,
        }
    }

    /// Builder for a single parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    /// The posted field group named `field`, when it is an object.
    pub fn posted(&self, field: &str) -> Option<&Map<String, Value>> {
        if !self.is_post() {
            return None;
        }
        self.params.get(field).and_then(Value::as_object)
    }
}
