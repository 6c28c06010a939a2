use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// A monitored solar installation.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Plant {
    /// Backend-assigned identifier; never changes once created.
    #[serde(alias = "id")]
    pub uid: String,
    /// Display name, never empty.
    pub name: String,
}

/// Body of create and update requests: the only attribute a user edits.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PlantDraft {
    pub name: String,
}

impl PlantDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The draft with its name trimmed, or a validation error if nothing
    /// is left.
    pub fn validated(&self) -> Result<PlantDraft, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Plant name is required".to_string()));
        }
        Ok(PlantDraft::new(name))
    }
}
