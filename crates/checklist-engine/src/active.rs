use checklist_model::ChecklistDefinition;
use checklist_xlsx::SpreadsheetDocument;

use crate::error::parse_error;
use crate::layout::{extract_checklist_column, resolve_checklist, to_records, SkippedRow};
use crate::records::RecordStore;
use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistSource {
    /// Read from the sheet's `ChecklistItems` column.
    Sheet,
    /// The sheet has no checklist of its own.
    Default,
}

/// Everything derived from the sheet currently being worked on.
#[derive(Debug, Clone)]
pub struct ActiveSheet {
    pub name: String,
    pub definition: ChecklistDefinition,
    pub source: ChecklistSource,
    pub records: RecordStore,
    /// Data rows that were not loaded because their status is unrecognized.
    pub skipped_rows: Vec<SkippedRow>,
}

impl ActiveSheet {
    /// Derive the checklist and records of `sheet`. Pure: `document` is not touched.
    pub fn derive(
        document: &SpreadsheetDocument,
        sheet: &str,
        default_checklist: &ChecklistDefinition,
    ) -> Result<Self, EngineError> {
        let name = document
            .sheet(sheet)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| EngineError::SheetNotFound(sheet.to_string()))?;
        let rows = document.sheet_rows(&name).map_err(parse_error)?;

        let source = if extract_checklist_column(&rows).is_empty() {
            ChecklistSource::Default
        } else {
            ChecklistSource::Sheet
        };
        let definition = resolve_checklist(&rows, default_checklist);
        let loaded = to_records(&rows);
        log::debug!(
            "derived sheet `{name}`: {} records, {} skipped rows, {} checklist items ({source:?})",
            loaded.records.len(),
            loaded.skipped.len(),
            definition.len()
        );
        Ok(Self {
            name,
            definition,
            source,
            records: RecordStore::new(loaded.records),
            skipped_rows: loaded.skipped,
        })
    }
}
