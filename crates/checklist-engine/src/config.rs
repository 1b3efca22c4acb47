use serde::Deserialize;

use crate::{EngineError, ValidationError};
use checklist_model::ChecklistDefinition;

pub const DEFAULT_SHEET_NAME: &str = "Checklist Datacenter";
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub fn default_checklist_items() -> Vec<String> {
    ["Temperature/Humidity", "Physical Cleaning", "Cable/Connection Check"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Engine settings. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sheet activated on open when present; otherwise the first sheet.
    pub preferred_sheet: String,
    /// Checklist used when the active sheet has no `ChecklistItems` column.
    pub default_checklist: Vec<String>,
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preferred_sheet: DEFAULT_SHEET_NAME.to_string(),
            default_checklist: default_checklist_items(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_slice(json: &[u8]) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        self.default_definition().map(|_| ())
    }

    pub fn default_definition(&self) -> Result<ChecklistDefinition, ValidationError> {
        ChecklistDefinition::new(&self.default_checklist)
            .map_err(|_| ValidationError::EmptyChecklist)
    }
}
