use checklist_fs::StoreError;
use checklist_xlsx::{SheetNameError, XlsxError};
use thiserror::Error;

/// Input rejected before any state change or I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no document is open")]
    NoDocumentOpen,
    #[error("the document has no save location; use save-as")]
    NoSaveLocation,
    #[error("respondent name must not be blank")]
    BlankRespondent,
    #[error("status must be OK, ALERT or FAIL (got `{0}`)")]
    InvalidStatus(String),
    #[error("correction notes must not be blank")]
    BlankCorrectionNotes,
    #[error("a sheet named `{0}` already exists")]
    DuplicateSheetName(String),
    #[error("invalid sheet name `{name}`: {reason}")]
    InvalidSheetName { name: String, reason: SheetNameError },
    #[error("the checklist needs at least one non-blank question")]
    EmptyChecklist,
    #[error("not allowed while a walkthrough is in progress")]
    WalkthroughInProgress,
    #[error("no walkthrough is in progress")]
    NoWalkthrough,
    #[error("respondent entry has not been started")]
    NotAwaitingRespondent,
    #[error("record {index} does not exist ({len} records)")]
    RecordOutOfRange { index: usize, len: usize },
    #[error("no edit is pending")]
    NoEditPending,
    #[error("no correction is pending")]
    NoCorrectionPending,
    #[error("page size must be at least 1")]
    InvalidPageSize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unable to read the workbook: {0}")]
    Parse(#[source] XlsxError),
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("`{location}` changed since it was opened; save to a new file instead")]
    Conflict { location: String },
    #[error("unable to write the workbook: {0}")]
    Serialization(#[source] XlsxError),
    #[error("{location}: I/O error: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("page {page} is out of range (1..={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl EngineError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { location } => EngineError::Conflict { location },
            StoreError::NotFound { location } => EngineError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
                location,
            },
            StoreError::Io { location, source } => EngineError::Io { location, source },
        }
    }
}

/// Sheet-level codec failures raised while rebuilding a workbook.
pub(crate) fn serialization_error(err: XlsxError) -> EngineError {
    match err {
        XlsxError::SheetNotFound(name) => EngineError::SheetNotFound(name),
        XlsxError::DuplicateSheetName(name) => ValidationError::DuplicateSheetName(name).into(),
        XlsxError::InvalidSheetName { name, reason } => {
            ValidationError::InvalidSheetName { name, reason }.into()
        }
        other => EngineError::Serialization(other),
    }
}

/// Failures raised while reading a workbook.
pub(crate) fn parse_error(err: XlsxError) -> EngineError {
    match err {
        XlsxError::SheetNotFound(name) => EngineError::SheetNotFound(name),
        other => EngineError::Parse(other),
    }
}
