use serde::{Deserialize, Serialize};

use crate::Status;

/// Placeholder shown and persisted when a record has no notes.
pub const NOTES_SENTINEL: &str = "None";

/// Placeholder written by older versions of the tool; read back as "no notes".
pub const LEGACY_NOTES_SENTINEL: &str = "Nenhuma";

/// One answered checklist step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `dd/mm/yyyy`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    /// Respondent name.
    pub name: String,
    /// Checklist label at the time the record was created.
    pub item: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record {
    /// Notes as displayed and persisted, with the sentinel standing in for `None`.
    pub fn notes_display(&self) -> &str {
        self.notes.as_deref().unwrap_or(NOTES_SENTINEL)
    }

    /// Normalize free text into the `notes` field: blank text and the sentinels
    /// mean "no notes".
    pub fn normalize_notes(text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == NOTES_SENTINEL || trimmed == LEGACY_NOTES_SENTINEL {
            None
        } else {
            Some(text.to_string())
        }
    }
}
