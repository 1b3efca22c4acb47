//! Checklist walkthrough engine.
//!
//! A [`ChecklistSession`] opens a workbook through a [`checklist_fs::DocumentStore`],
//! derives the checklist and records of the active sheet, records walkthrough
//! answers, and writes everything back with conflict detection. The record
//! helpers ([`RecordStore`], [`paginate`], [`chart`]) are usable on their own.

mod active;
pub mod chart;
mod clock;
mod config;
mod error;
pub mod layout;
mod pagination;
mod records;
mod session;

pub use active::{ActiveSheet, ChecklistSource};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{default_checklist_items, EngineConfig, DEFAULT_PAGE_SIZE, DEFAULT_SHEET_NAME};
pub use error::{EngineError, ValidationError};
pub use pagination::{page_count, paginate, Page, Pager};
pub use records::{CorrectionState, EditingState, RecordStore, CORRECTION_TIMESTAMP_FORMAT};
pub use session::{ChecklistSession, SessionState, StepOutcome};

pub use checklist_model::{ChecklistDefinition, FilterCriteria, Record, Status};
