//! The checklist walkthrough state machine and the document it works on.

use checklist_fs::{DocumentHandle, DocumentStore};
use checklist_model::{ChecklistDefinition, Record, Status, DATE_FORMAT, TIME_FORMAT};
use checklist_xlsx::{SpreadsheetDocument, XlsxError};

use crate::active::ActiveSheet;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{parse_error, serialization_error};
use crate::layout;
use crate::pagination::Pager;
use crate::records::{RecordStore, CORRECTION_TIMESTAMP_FORMAT};
use crate::{EngineError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No document open.
    Idle,
    SheetReady,
    /// Waiting for the respondent's name before step 0.
    AwaitingRespondent,
    InProgress { step: usize, respondent: String },
}

/// What happened after a step was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Next { step: usize },
    Finished,
}

#[derive(Debug)]
struct OpenDocument<H> {
    document: SpreadsheetDocument,
    /// Where `save` writes; `None` for documents that were never stored.
    handle: Option<H>,
    active: ActiveSheet,
    /// Sheets were added or rewritten in memory since the last save.
    dirty: bool,
}

/// One operator session over one open workbook.
///
/// All operations validate first and only change state once every fallible
/// step (parsing, serialization, I/O) has succeeded.
pub struct ChecklistSession<S: DocumentStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
    default_checklist: ChecklistDefinition,
    state: SessionState,
    open: Option<OpenDocument<S::Handle>>,
}

impl<S: DocumentStore> ChecklistSession<S, SystemClock> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: DocumentStore, C: Clock> ChecklistSession<S, C> {
    pub fn with_clock(store: S, config: EngineConfig, clock: C) -> Result<Self, EngineError> {
        config.validate()?;
        let default_checklist = config.default_definition()?;
        Ok(Self {
            store,
            clock,
            config,
            default_checklist,
            state: SessionState::Idle,
            open: None,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn document(&self) -> Option<&SpreadsheetDocument> {
        self.open.as_ref().map(|open| &open.document)
    }

    /// Display name of the save location, if the document has one.
    pub fn document_name(&self) -> Option<&str> {
        self.open
            .as_ref()
            .and_then(|open| open.handle.as_ref())
            .map(|handle| handle.name())
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.document().map(|doc| doc.sheet_names()).unwrap_or_default()
    }

    pub fn active_sheet(&self) -> Option<&ActiveSheet> {
        self.open.as_ref().map(|open| &open.active)
    }

    pub fn definition(&self) -> Option<&ChecklistDefinition> {
        self.active_sheet().map(|active| &active.definition)
    }

    pub fn records(&self) -> Option<&RecordStore> {
        self.active_sheet().map(|active| &active.records)
    }

    pub fn records_mut(&mut self) -> Option<&mut RecordStore> {
        self.open.as_mut().map(|open| &mut open.active.records)
    }

    /// Unsaved changes to records or sheets.
    pub fn is_modified(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|open| open.dirty || open.active.records.is_modified())
    }

    /// The step awaiting an answer and its checklist label.
    pub fn current_step(&self) -> Option<(usize, &str)> {
        let SessionState::InProgress { step, .. } = &self.state else {
            return None;
        };
        self.definition()
            .and_then(|def| def.get(*step))
            .map(|label| (*step, label))
    }

    fn ensure_idle_walkthrough(&self) -> Result<(), ValidationError> {
        match self.state {
            SessionState::InProgress { .. } => Err(ValidationError::WalkthroughInProgress),
            _ => Ok(()),
        }
    }

    fn open_ref(&self) -> Result<&OpenDocument<S::Handle>, ValidationError> {
        self.open.as_ref().ok_or(ValidationError::NoDocumentOpen)
    }

    /// A pager sized by the configured page size.
    pub fn pager(&self) -> Result<Pager, ValidationError> {
        Pager::new(self.config.page_size)
    }

    /// Adopt `bytes` as the open document, activating the preferred sheet (or
    /// the first one).
    pub fn open_document(
        &mut self,
        bytes: &[u8],
        handle: Option<S::Handle>,
    ) -> Result<(), EngineError> {
        self.ensure_idle_walkthrough()?;
        let document = SpreadsheetDocument::from_bytes(bytes).map_err(parse_error)?;
        let sheet = match document.sheet(&self.config.preferred_sheet) {
            Some(entry) => entry.name.clone(),
            None => document
                .sheet_names()
                .first()
                .map(|name| name.to_string())
                .ok_or_else(|| {
                    EngineError::Parse(XlsxError::Invalid("workbook has no sheets".to_string()))
                })?,
        };
        let active = ActiveSheet::derive(&document, &sheet, &self.default_checklist)?;
        log::info!(
            "opened workbook ({} sheets), active sheet `{}` with {} records",
            document.sheets().len(),
            active.name,
            active.records.len()
        );
        self.open = Some(OpenDocument {
            document,
            handle,
            active,
            dirty: false,
        });
        self.state = SessionState::SheetReady;
        Ok(())
    }

    /// Start from an empty one-sheet workbook with no save location.
    pub fn new_document(&mut self, sheet_name: &str) -> Result<(), EngineError> {
        self.ensure_idle_walkthrough()?;
        let document = SpreadsheetDocument::new_blank(sheet_name).map_err(serialization_error)?;
        let active = ActiveSheet::derive(&document, sheet_name, &self.default_checklist)?;
        self.open = Some(OpenDocument {
            document,
            handle: None,
            active,
            dirty: true,
        });
        self.state = SessionState::SheetReady;
        Ok(())
    }

    /// Read `location` through the store and open it.
    pub async fn open(&mut self, location: &str) -> Result<(), EngineError> {
        self.ensure_idle_walkthrough()?;
        let (bytes, handle) = self.store.open_for_read(location).await?;
        self.open_document(&bytes, Some(handle))
    }

    fn discard_unsaved(open: &OpenDocument<S::Handle>) {
        if open.active.records.is_modified() {
            log::warn!(
                "leaving sheet `{}`: discarding unsaved changes to {} records",
                open.active.name,
                open.active.records.len()
            );
        }
    }

    /// Switch to another sheet, reloading its records from the workbook.
    /// Unsaved records of the current sheet are discarded.
    pub fn select_sheet(&mut self, name: &str) -> Result<(), EngineError> {
        self.ensure_idle_walkthrough()?;
        let open = self.open_ref()?;
        let active = ActiveSheet::derive(&open.document, name, &self.default_checklist)?;
        Self::discard_unsaved(open);

        log::debug!("switched to sheet `{}`", active.name);
        if let Some(open) = self.open.as_mut() {
            open.active = active;
        }
        self.state = SessionState::SheetReady;
        Ok(())
    }

    /// Add a sheet whose `ChecklistItems` column holds `questions` and make it
    /// active. Like [`select_sheet`](Self::select_sheet), this drops the
    /// current sheet's unsaved records.
    pub fn create_sheet(&mut self, name: &str, questions: &[String]) -> Result<(), EngineError> {
        self.ensure_idle_walkthrough()?;
        let open = self.open_ref()?;
        let document = layout::create_sheet(&open.document, name, questions)?;
        let active = ActiveSheet::derive(&document, name, &self.default_checklist)?;
        Self::discard_unsaved(open);

        if let Some(open) = self.open.as_mut() {
            open.document = document;
            open.active = active;
            open.dirty = true;
        }
        self.state = SessionState::SheetReady;
        Ok(())
    }

    pub fn begin_respondent_entry(&mut self) -> Result<(), EngineError> {
        self.open_ref()?;
        self.ensure_idle_walkthrough()?;
        self.state = SessionState::AwaitingRespondent;
        Ok(())
    }

    pub fn confirm_respondent(&mut self, name: &str) -> Result<(), EngineError> {
        if self.state != SessionState::AwaitingRespondent {
            return Err(ValidationError::NotAwaitingRespondent.into());
        }
        let respondent = name.trim();
        if respondent.is_empty() {
            return Err(ValidationError::BlankRespondent.into());
        }
        log::debug!("walkthrough started by `{respondent}`");
        self.state = SessionState::InProgress {
            step: 0,
            respondent: respondent.to_string(),
        };
        Ok(())
    }

    /// Record the answer for the current step and move on.
    pub fn submit_step(&mut self, status: &str, notes: &str) -> Result<StepOutcome, EngineError> {
        let SessionState::InProgress { step, respondent } = &self.state else {
            return Err(ValidationError::NoWalkthrough.into());
        };
        let (step, respondent) = (*step, respondent.clone());
        let status: Status = status
            .parse()
            .map_err(|_| ValidationError::InvalidStatus(status.to_string()))?;
        let open = self.open.as_mut().ok_or(ValidationError::NoDocumentOpen)?;
        let item = open
            .active
            .definition
            .get(step)
            .ok_or(ValidationError::NoWalkthrough)?
            .to_string();
        let steps = open.active.definition.len();

        let now = self.clock.now();
        open.active.records.append(Record {
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
            name: respondent.clone(),
            item,
            status,
            notes: Record::normalize_notes(notes),
        });

        if step + 1 < steps {
            self.state = SessionState::InProgress {
                step: step + 1,
                respondent,
            };
            Ok(StepOutcome::Next { step: step + 1 })
        } else {
            log::info!("walkthrough finished after {steps} steps");
            self.state = SessionState::SheetReady;
            Ok(StepOutcome::Finished)
        }
    }

    /// Abandon the walkthrough. Steps already submitted stay recorded.
    pub fn cancel_walkthrough(&mut self) -> Result<(), EngineError> {
        match self.state {
            SessionState::InProgress { .. } | SessionState::AwaitingRespondent => {
                self.state = SessionState::SheetReady;
                Ok(())
            }
            _ => Err(ValidationError::NoWalkthrough.into()),
        }
    }

    /// Correct record `index` now.
    pub fn correct_record(&mut self, index: usize, notes: &str) -> Result<(), EngineError> {
        let timestamp = self.clock.now().format(CORRECTION_TIMESTAMP_FORMAT).to_string();
        let records = self.records_mut().ok_or(ValidationError::NoDocumentOpen)?;
        records.correct(index, notes, &timestamp)?;
        Ok(())
    }

    /// Apply the pending correction stamped with the session clock.
    pub fn commit_correction(&mut self) -> Result<usize, EngineError> {
        let now = self.clock.now();
        let records = self.records_mut().ok_or(ValidationError::NoDocumentOpen)?;
        Ok(records.commit_correction(now)?)
    }

    /// Write the document back to where it was opened from.
    ///
    /// A [`EngineError::Conflict`] means the stored file changed underneath us;
    /// the session is unchanged and [`save_as`](Self::save_as) still works.
    pub async fn save(&mut self) -> Result<(), EngineError> {
        let open = self.open.as_mut().ok_or(ValidationError::NoDocumentOpen)?;
        let handle = open.handle.as_mut().ok_or(ValidationError::NoSaveLocation)?;
        let (document, bytes) = layout::serialize(
            &open.document,
            &open.active.name,
            open.active.records.records(),
            &open.active.skipped_rows,
            open.active.definition.items(),
        )?;

        if let Err(err) = self.store.write(handle, &bytes).await {
            if err.is_conflict() {
                log::warn!("save refused: {err}");
            }
            return Err(err.into());
        }
        log::info!("saved `{}` ({} bytes)", handle.name(), bytes.len());
        open.document = document;
        open.active.records.mark_saved();
        open.dirty = false;
        Ok(())
    }

    /// Write the document to a new location, which becomes the save target.
    pub async fn save_as(&mut self, name: &str) -> Result<(), EngineError> {
        let open = self.open_ref()?;
        let (document, bytes) = layout::serialize(
            &open.document,
            &open.active.name,
            open.active.records.records(),
            &open.active.skipped_rows,
            open.active.definition.items(),
        )?;

        let mut handle = self.store.open_for_write(name).await?;
        self.store.write(&mut handle, &bytes).await?;
        log::info!("saved as `{}` ({} bytes)", handle.name(), bytes.len());

        if let Some(open) = self.open.as_mut() {
            open.document = document;
            open.handle = Some(handle);
            open.active.records.mark_saved();
            open.dirty = false;
        }
        Ok(())
    }
}
