use chrono::NaiveDateTime;

use checklist_model::{FilterCriteria, Record, Status};

use crate::ValidationError;

/// Timestamp format used in correction banners.
pub const CORRECTION_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// A record whose notes are being edited; `draft` is not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingState {
    pub index: usize,
    pub draft: String,
}

/// A record being corrected; `draft` holds the correction notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionState {
    pub index: usize,
    pub draft: String,
}

/// Ordered, index-addressed records of the active sheet.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    editing: Option<EditingState>,
    correcting: Option<CorrectionState>,
    modified: bool,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when records changed since load or the last [`mark_saved`](Self::mark_saved).
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
        self.modified = true;
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(ValidationError::RecordOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    pub fn editing(&self) -> Option<&EditingState> {
        self.editing.as_ref()
    }

    /// Start editing the notes of `index`, replacing any other pending edit.
    pub fn begin_edit(&mut self, index: usize) -> Result<(), ValidationError> {
        self.check_index(index)?;
        self.editing = Some(EditingState {
            index,
            draft: self.records[index].notes_display().to_string(),
        });
        Ok(())
    }

    pub fn update_edit(&mut self, text: &str) -> Result<(), ValidationError> {
        let editing = self.editing.as_mut().ok_or(ValidationError::NoEditPending)?;
        editing.draft = text.to_string();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Apply the pending draft and return the edited index.
    pub fn commit_edit(&mut self) -> Result<usize, ValidationError> {
        let EditingState { index, draft } =
            self.editing.clone().ok_or(ValidationError::NoEditPending)?;
        if self.edit(index, &draft) {
            Ok(index)
        } else {
            self.editing = None;
            Err(ValidationError::RecordOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    /// Replace the notes of `index` if an edit is pending for it.
    ///
    /// Does nothing (and returns false) when `index` is out of range or not the
    /// record being edited. Blank notes become "no notes".
    pub fn edit(&mut self, index: usize, notes: &str) -> bool {
        let pending = self.editing.as_ref().is_some_and(|e| e.index == index);
        if !pending || index >= self.records.len() {
            return false;
        }
        self.records[index].notes = Record::normalize_notes(notes);
        self.editing = None;
        self.modified = true;
        log::debug!("edited notes of record {index}");
        true
    }

    pub fn correcting(&self) -> Option<&CorrectionState> {
        self.correcting.as_ref()
    }

    pub fn begin_correction(&mut self, index: usize) -> Result<(), ValidationError> {
        self.check_index(index)?;
        self.correcting = Some(CorrectionState {
            index,
            draft: String::new(),
        });
        Ok(())
    }

    pub fn update_correction(&mut self, text: &str) -> Result<(), ValidationError> {
        let correcting = self
            .correcting
            .as_mut()
            .ok_or(ValidationError::NoCorrectionPending)?;
        correcting.draft = text.to_string();
        Ok(())
    }

    pub fn cancel_correction(&mut self) {
        self.correcting = None;
    }

    /// Apply the pending correction stamped with `now`. A rejected correction
    /// stays pending.
    pub fn commit_correction(&mut self, now: NaiveDateTime) -> Result<usize, ValidationError> {
        let CorrectionState { index, draft } = self
            .correcting
            .clone()
            .ok_or(ValidationError::NoCorrectionPending)?;
        let timestamp = now.format(CORRECTION_TIMESTAMP_FORMAT).to_string();
        self.correct(index, &draft, &timestamp)?;
        Ok(index)
    }

    /// Mark `index` as OK and prepend a correction banner to its notes.
    ///
    /// The old notes are kept after the banner; there is no other history.
    pub fn correct(
        &mut self,
        index: usize,
        notes: &str,
        timestamp: &str,
    ) -> Result<(), ValidationError> {
        if notes.trim().is_empty() {
            return Err(ValidationError::BlankCorrectionNotes);
        }
        self.check_index(index)?;

        let record = &mut self.records[index];
        let original = record.notes_display().to_string();
        record.status = Status::Ok;
        record.notes = Some(format!(
            "--- CORRECTION @ {timestamp} ---\n{notes}\n---\nOriginal: {original}"
        ));
        self.modified = true;
        if self.correcting.as_ref().is_some_and(|c| c.index == index) {
            self.correcting = None;
        }
        if self.editing.as_ref().is_some_and(|e| e.index == index) {
            self.editing = None;
        }
        log::debug!("corrected record {index}");
        Ok(())
    }

    /// Matching records with their indices in the store, in store order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<(&Record, usize)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| criteria.matches(record))
            .map(|(index, record)| (record, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(name: &str, status: Status, notes: Option<&str>) -> Record {
        Record {
            date: "01/03/2024".to_string(),
            time: "08:00:00".to_string(),
            name: name.to_string(),
            item: "Fans".to_string(),
            status,
            notes: notes.map(str::to_string),
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(vec![
            record("Ana", Status::Ok, Some("fine")),
            record("Bruno", Status::Fail, Some("fan stopped")),
            record("Carla", Status::Alert, None),
        ])
    }

    #[test]
    fn edit_is_a_no_op_without_a_pending_edit() {
        let mut store = store();
        assert!(!store.edit(0, "changed"));
        assert_eq!(store.get(0).and_then(|r| r.notes.as_deref()), Some("fine"));
        assert!(!store.is_modified());

        store.begin_edit(1).expect("begin");
        assert!(!store.edit(0, "changed"));
        assert!(!store.edit(7, "changed"));
        assert_eq!(store.get(0).and_then(|r| r.notes.as_deref()), Some("fine"));
    }

    #[test]
    fn edit_flow_applies_the_draft() {
        let mut store = store();
        store.begin_edit(2).expect("begin");
        assert_eq!(store.editing().map(|e| e.draft.as_str()), Some("None"));
        store.update_edit("filters replaced").expect("update");
        assert_eq!(store.commit_edit(), Ok(2));
        assert_eq!(store.get(2).and_then(|r| r.notes.as_deref()), Some("filters replaced"));
        assert!(store.editing().is_none());
        assert!(store.is_modified());
    }

    #[test]
    fn empty_edit_restores_the_sentinel() {
        let mut store = store();
        store.begin_edit(0).expect("begin");
        assert!(store.edit(0, "  "));
        assert_eq!(store.get(0).map(Record::notes_display), Some("None"));
    }

    #[test]
    fn cancel_edit_discards_the_draft() {
        let mut store = store();
        store.begin_edit(0).expect("begin");
        store.update_edit("draft").expect("update");
        store.cancel_edit();
        assert_eq!(store.commit_edit(), Err(ValidationError::NoEditPending));
        assert_eq!(store.get(0).and_then(|r| r.notes.as_deref()), Some("fine"));
        assert_eq!(store.update_edit("x"), Err(ValidationError::NoEditPending));
    }

    #[test]
    fn begin_edit_rejects_unknown_records() {
        let mut store = store();
        assert_eq!(
            store.begin_edit(3),
            Err(ValidationError::RecordOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn correction_marks_ok_and_keeps_both_texts() {
        let mut store = store();
        store
            .correct(1, "replaced fan", "02/03/2024 10:00:00")
            .expect("correct");
        let corrected = store.get(1).expect("record");
        assert_eq!(corrected.status, Status::Ok);
        assert_eq!(
            corrected.notes.as_deref(),
            Some(concat!(
                "--- CORRECTION @ 02/03/2024 10:00:00 ---\n",
                "replaced fan\n---\nOriginal: fan stopped",
            ))
        );
        assert!(store.is_modified());
    }

    #[test]
    fn correction_validates_before_mutating() {
        let mut store = store();
        assert_eq!(
            store.correct(1, "   ", "ts"),
            Err(ValidationError::BlankCorrectionNotes)
        );
        assert_eq!(
            store.correct(9, "x", "ts"),
            Err(ValidationError::RecordOutOfRange { index: 9, len: 3 })
        );
        assert_eq!(store.get(1).map(|r| r.status), Some(Status::Fail));
        assert!(!store.is_modified());
    }

    #[test]
    fn commit_correction_uses_the_clock_timestamp() {
        let mut store = store();
        let now = NaiveDate::from_ymd_opt(2024, 3, 2)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .expect("timestamp");

        store.begin_correction(2).expect("begin");
        assert_eq!(store.commit_correction(now), Err(ValidationError::BlankCorrectionNotes));
        assert!(store.correcting().is_some());

        store.update_correction("sensor recalibrated").expect("update");
        assert_eq!(store.commit_correction(now), Ok(2));
        assert!(store.correcting().is_none());
        let notes = store.get(2).and_then(|r| r.notes.clone()).expect("notes");
        assert!(notes.starts_with("--- CORRECTION @ 02/03/2024 14:05:09 ---\nsensor recalibrated"));
        assert!(notes.ends_with("Original: None"));
    }

    #[test]
    fn filter_returns_original_indices() {
        let store = store();
        let criteria = FilterCriteria::default().with_name("A");
        let hits: Vec<(String, usize)> = store
            .filter(&criteria)
            .into_iter()
            .map(|(r, i)| (r.name.clone(), i))
            .collect();
        assert_eq!(hits, vec![("Ana".to_string(), 0), ("Carla".to_string(), 2)]);

        let criteria = criteria.with_status(Status::Alert);
        assert_eq!(store.filter(&criteria).len(), 1);
    }

    #[test]
    fn mark_saved_clears_the_modified_flag() {
        let mut store = store();
        store.append(record("Dani", Status::Ok, None));
        assert!(store.is_modified());
        store.mark_saved();
        assert!(!store.is_modified());
        assert_eq!(store.len(), 4);
    }
}
