//! Result shapes returned to callers.

use serde::{Deserialize, Serialize};

use crate::validation::Validations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveResult {
    Saved,
    Failed,
}

/// Outcome of add, set and settings updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub result: SaveResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Validations::is_empty")]
    pub validations: Validations,
    /// Message from a pre-save hook that vetoed the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved() -> Self {
        Self {
            result: SaveResult::Saved,
            uuid: None,
            validations: Validations::new(),
            error: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            result: SaveResult::Failed,
            ..Self::saved()
        }
    }

    pub fn invalid(validations: Validations) -> Self {
        Self {
            validations,
            ..Self::failed()
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::failed()
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn is_saved(&self) -> bool {
        self.result == SaveResult::Saved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteResult {
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "failed")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub result: DeleteResult,
}

impl DeleteResponse {
    pub fn new(result: DeleteResult) -> Self {
        Self { result }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleResult {
    Enabled,
    Disabled,
    #[serde(rename = "failed")]
    Failed,
}

/// Outcome of a toggle; `changed` is absent when the entry was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub result: ToggleResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

impl ToggleResponse {
    pub fn failed() -> Self {
        Self {
            result: ToggleResult::Failed,
            changed: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.changed.unwrap_or(false)
    }
}
