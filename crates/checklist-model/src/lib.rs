//! `checklist-model` holds the plain data types shared by the checklist engine.
//!
//! Everything here is `serde`-serializable so front ends can ship records and
//! filter state across an IPC boundary as JSON.

mod checklist;
mod filter;
mod record;
mod status;

pub use checklist::{dedup_labels, ChecklistDefinition, EmptyChecklistError};
pub use filter::FilterCriteria;
pub use record::{Record, LEGACY_NOTES_SENTINEL, NOTES_SENTINEL};
pub use status::{ParseStatusError, Status};

/// `chrono` format for the record date column (`dd/mm/yyyy`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// `chrono` format for the record time column (`HH:MM:SS`).
pub const TIME_FORMAT: &str = "%H:%M:%S";
