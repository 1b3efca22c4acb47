//! Mapping between worksheet rows and checklist records.
//!
//! Sheet layout (row 0 is the header):
//!
//! | Data | Hora | Nome | Item Verificado | Status | Observações | ChecklistItems |
//!
//! The first six columns hold one record per row. `ChecklistItems` holds the
//! checklist definition, one label per row, and is paired with the record
//! columns purely by row index: row *i* carries record *i* and checklist item
//! *i*, and nothing relates the two. When the lengths differ the shorter side
//! is left blank.
//!
//! Data rows that do not parse as records are carried through a rewrite
//! verbatim, after the records.

use chrono::{Duration, NaiveDate, NaiveTime};

use checklist_model::{
    dedup_labels, ChecklistDefinition, Record, Status, DATE_FORMAT, TIME_FORMAT,
};
use checklist_xlsx::{
    sheet_name_eq_case_insensitive, validate_sheet_name, SheetRows, SpreadsheetDocument,
};

use crate::error::serialization_error;
use crate::{EngineError, ValidationError};

pub const CHECKLIST_COLUMN_HEADER: &str = "ChecklistItems";

pub const HEADER: [&str; 7] = [
    "Data",
    "Hora",
    "Nome",
    "Item Verificado",
    "Status",
    "Observações",
    CHECKLIST_COLUMN_HEADER,
];

/// Column widths in characters, matching [`HEADER`].
pub const COLUMN_WIDTHS: [f64; 7] = [12.0, 10.0, 20.0, 30.0, 10.0, 40.0, 30.0];

const RECORD_COLUMNS: usize = 6;

/// A data row that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based worksheet row number.
    pub row: usize,
    pub status: String,
    /// The six record cells as read, written back unchanged on save.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

/// Labels below the `ChecklistItems` header, trimmed and de-duplicated.
///
/// Returns an empty list when the header row has no such column.
pub fn extract_checklist_column(rows: &[Vec<String>]) -> Vec<String> {
    let Some(header) = rows.first() else {
        return Vec::new();
    };
    let Some(col) = header
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case(CHECKLIST_COLUMN_HEADER))
    else {
        return Vec::new();
    };
    dedup_labels(rows[1..].iter().filter_map(|row| row.get(col)))
}

/// The sheet's own checklist when it has one, otherwise `default`.
pub fn resolve_checklist(
    rows: &[Vec<String>],
    default: &ChecklistDefinition,
) -> ChecklistDefinition {
    match ChecklistDefinition::new(extract_checklist_column(rows)) {
        Ok(definition) => definition,
        Err(_) => default.clone(),
    }
}

/// Records from every data row below the header.
///
/// Rows whose six record cells are all blank are dropped silently; rows with an
/// unrecognized status are skipped and reported.
pub fn to_records(rows: &[Vec<String>]) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");
        if (0..RECORD_COLUMNS).all(|col| cell(col).trim().is_empty()) {
            continue;
        }
        let status = match cell(4).parse::<Status>() {
            Ok(status) => status,
            Err(_) => {
                log::warn!("skipping row {}: unrecognized status `{}`", idx + 1, cell(4));
                loaded.skipped.push(SkippedRow {
                    row: idx + 1,
                    status: cell(4).to_string(),
                    cells: (0..RECORD_COLUMNS).map(|col| cell(col).to_string()).collect(),
                });
                continue;
            }
        };
        loaded.records.push(Record {
            date: render_date_cell(cell(0)),
            time: render_time_cell(cell(1)),
            name: cell(2).to_string(),
            item: cell(3).to_string(),
            status,
            notes: Record::normalize_notes(cell(5)),
        });
    }
    loaded
}

fn record_cells(record: &Record) -> Vec<String> {
    vec![
        record.date.clone(),
        record.time.clone(),
        record.name.clone(),
        record.item.clone(),
        record.status.to_string(),
        record.notes_display().to_string(),
    ]
}

/// Header plus the records, then the `skipped` rows as read, padded with
/// blank record cells until every checklist item has a row.
pub fn sheet_rows(records: &[Record], skipped: &[SkippedRow], items: &[String]) -> SheetRows {
    let len = (records.len() + skipped.len()).max(items.len());
    let mut data = records
        .iter()
        .map(record_cells)
        .chain(skipped.iter().map(|row| row.cells.clone()));
    let mut rows = Vec::with_capacity(len + 1);
    rows.push(HEADER.iter().map(|h| h.to_string()).collect());
    for idx in 0..len {
        let mut row = data
            .next()
            .unwrap_or_else(|| vec![String::new(); RECORD_COLUMNS]);
        row.resize(RECORD_COLUMNS, String::new());
        row.push(items.get(idx).cloned().unwrap_or_default());
        rows.push(row);
    }
    rows
}

/// Replace the cells of `sheet` in memory without encoding the workbook.
pub fn write_sheet(
    document: &mut SpreadsheetDocument,
    sheet: &str,
    records: &[Record],
    skipped: &[SkippedRow],
    items: &[String],
) -> Result<(), EngineError> {
    document
        .replace_sheet_rows(sheet, &sheet_rows(records, skipped, items), &COLUMN_WIDTHS)
        .map_err(serialization_error)
}

/// Rewrite `sheet` with `records` and `items` and encode the whole workbook.
///
/// `document` is left as is; the rebuilt copy is returned next to its bytes so
/// the caller can adopt it once the bytes are safely stored.
pub fn serialize(
    document: &SpreadsheetDocument,
    sheet: &str,
    records: &[Record],
    skipped: &[SkippedRow],
    items: &[String],
) -> Result<(SpreadsheetDocument, Vec<u8>), EngineError> {
    let mut rebuilt = document.clone();
    write_sheet(&mut rebuilt, sheet, records, skipped, items)?;
    let bytes = rebuilt.to_bytes().map_err(EngineError::Serialization)?;
    log::debug!(
        "serialized sheet `{sheet}`: {} records, {} checklist items, {} bytes",
        records.len(),
        items.len(),
        bytes.len()
    );
    Ok((rebuilt, bytes))
}

/// Check a new sheet's name and questions against `document`.
pub fn validate_new_sheet(
    document: &SpreadsheetDocument,
    name: &str,
    questions: &[String],
) -> Result<Vec<String>, ValidationError> {
    validate_sheet_name(name).map_err(|reason| ValidationError::InvalidSheetName {
        name: name.to_string(),
        reason,
    })?;
    if document
        .sheet_names()
        .iter()
        .any(|existing| sheet_name_eq_case_insensitive(existing, name))
    {
        return Err(ValidationError::DuplicateSheetName(name.to_string()));
    }
    let questions = dedup_labels(questions);
    if questions.is_empty() {
        return Err(ValidationError::EmptyChecklist);
    }
    Ok(questions)
}

/// A copy of `document` with a new sheet holding the header and one question
/// per row in the `ChecklistItems` column.
pub fn create_sheet(
    document: &SpreadsheetDocument,
    name: &str,
    questions: &[String],
) -> Result<SpreadsheetDocument, EngineError> {
    let questions = validate_new_sheet(document, name, questions)?;
    let rows = sheet_rows(&[], &[], &questions);
    let mut updated = document.clone();
    updated
        .add_sheet(name, &rows, &COLUMN_WIDTHS)
        .map_err(serialization_error)?;
    log::info!("created sheet `{name}` with {} questions", questions.len());
    Ok(updated)
}

const MAX_EXCEL_SERIAL: f64 = 2_958_465.0; // 31/12/9999

fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Date cells saved as numbers by spreadsheet apps hold a 1900-system serial.
fn render_date_cell(raw: &str) -> String {
    let Ok(serial) = raw.trim().parse::<f64>() else {
        return raw.to_string();
    };
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return raw.to_string();
    }
    excel_epoch()
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Time cells saved as numbers hold a fraction of a day (date part ignored).
fn render_time_cell(raw: &str) -> String {
    let Ok(serial) = raw.trim().parse::<f64>() else {
        return raw.to_string();
    };
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return raw.to_string();
    }
    let secs = ((serial.fract() * 86_400.0).round() as u32) % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
        .map(|time| time.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn header() -> Vec<String> {
        row(&HEADER)
    }

    #[test]
    fn extracts_checklist_column_case_insensitively() {
        let rows = vec![
            row(&["Data", "Hora", "Nome", "Item", "Status", "Obs", " checklistitems "]),
            row(&["", "", "", "", "", "", "A"]),
            row(&["", "", "", "", "", "", "B"]),
            row(&["", "", "", "", "", "", "A"]),
            row(&["", "", "", "", "", "", ""]),
            row(&["", "", "", "", "", "", " "]),
            row(&["x"]),
        ];
        assert_eq!(extract_checklist_column(&rows), vec!["A", "B"]);
    }

    #[test]
    fn missing_checklist_column_falls_back_to_default() {
        let rows = vec![row(&["Data", "Hora"]), row(&["01/01/2024", "10:00:00"])];
        assert!(extract_checklist_column(&rows).is_empty());
        let default = ChecklistDefinition::new(["UPS"]).expect("default");
        assert_eq!(resolve_checklist(&rows, &default), default);
        assert!(extract_checklist_column(&[]).is_empty());
    }

    #[test]
    fn to_records_maps_columns_and_drops_blank_rows() {
        let rows = vec![
            header(),
            row(&["01/03/2024", "08:00:00", "Ana", "UPS", "ok", "", "UPS"]),
            row(&["", "", "", "", "", "", "Fans"]),
            row(&["02/03/2024", "09:30:00", "Bruno", "Fans", "FALHA", "noisy"]),
        ];
        let loaded = to_records(&rows);
        assert!(loaded.skipped.is_empty());
        assert_eq!(
            loaded.records,
            vec![
                Record {
                    date: "01/03/2024".to_string(),
                    time: "08:00:00".to_string(),
                    name: "Ana".to_string(),
                    item: "UPS".to_string(),
                    status: Status::Ok,
                    notes: None,
                },
                Record {
                    date: "02/03/2024".to_string(),
                    time: "09:30:00".to_string(),
                    name: "Bruno".to_string(),
                    item: "Fans".to_string(),
                    status: Status::Fail,
                    notes: Some("noisy".to_string()),
                },
            ]
        );
    }

    #[test]
    fn rows_with_unknown_status_are_reported() {
        let rows = vec![
            header(),
            row(&["01/03/2024", "08:00:00", "Ana", "UPS", "maybe", "x"]),
            row(&["01/03/2024", "08:00:00", "Ana", "UPS", "ALERT", "x"]),
        ];
        let loaded = to_records(&rows);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(
            loaded.skipped,
            vec![SkippedRow {
                row: 2,
                status: "maybe".to_string(),
                cells: row(&["01/03/2024", "08:00:00", "Ana", "UPS", "maybe", "x"]),
            }]
        );
    }

    #[test]
    fn skipped_rows_are_written_back_after_records() {
        let rows = vec![
            header(),
            row(&["01/03/2024", "08:00:00", "Bruno", "UPS", "OK", "", "UPS"]),
            row(&["01/03/2024", "08:05:00", "Carla", "Fans", "", "status pending, rack 4", "Fans"]),
            row(&["", "", "", "", "", "", "Doors"]),
        ];
        let loaded = to_records(&rows);
        assert_eq!(loaded.skipped.len(), 1);

        let items = extract_checklist_column(&rows);
        let rewritten = sheet_rows(&loaded.records, &loaded.skipped, &items);
        assert_eq!(
            rewritten,
            vec![
                header(),
                row(&["01/03/2024", "08:00:00", "Bruno", "UPS", "OK", "None", "UPS"]),
                row(&[
                    "01/03/2024",
                    "08:05:00",
                    "Carla",
                    "Fans",
                    "",
                    "status pending, rack 4",
                    "Fans",
                ]),
                row(&["", "", "", "", "", "", "Doors"]),
            ]
        );
        assert_eq!(to_records(&rewritten), loaded);
    }

    #[test]
    fn numeric_date_and_time_cells_are_rendered() {
        let rows = vec![header(), row(&["45352", "0.34375", "Ana", "UPS", "OK"])];
        let loaded = to_records(&rows);
        assert_eq!(loaded.records[0].date, "01/03/2024");
        assert_eq!(loaded.records[0].time, "08:15:00");
    }

    #[test]
    fn sheet_rows_pad_the_shorter_sequence() {
        let records = vec![Record {
            date: "01/03/2024".to_string(),
            time: "08:00:00".to_string(),
            name: "Ana".to_string(),
            item: "UPS".to_string(),
            status: Status::Alert,
            notes: None,
        }];
        let items = vec!["UPS".to_string(), "Fans".to_string()];
        assert_eq!(
            sheet_rows(&records, &[], &items),
            vec![
                header(),
                row(&["01/03/2024", "08:00:00", "Ana", "UPS", "ALERT", "None", "UPS"]),
                row(&["", "", "", "", "", "", "Fans"]),
            ]
        );

        let only_records = sheet_rows(&records, &[], &[]);
        assert_eq!(only_records.len(), 2);
        assert_eq!(only_records[1][6], "");
    }

    #[test]
    fn new_sheet_validation() {
        let doc = SpreadsheetDocument::new_blank("Checklist Datacenter").expect("blank");
        let questions = vec!["UPS".to_string()];
        assert_eq!(
            validate_new_sheet(&doc, "checklist DATACENTER", &questions),
            Err(ValidationError::DuplicateSheetName("checklist DATACENTER".to_string()))
        );
        assert_eq!(
            validate_new_sheet(&doc, "Sala 2", &[" ".to_string()]),
            Err(ValidationError::EmptyChecklist)
        );
        assert!(matches!(
            validate_new_sheet(&doc, "Sala:2", &questions),
            Err(ValidationError::InvalidSheetName { .. })
        ));
    }

    #[test]
    fn created_sheet_carries_only_questions() {
        let doc = SpreadsheetDocument::new_blank("Checklist Datacenter").expect("blank");
        let questions = vec!["UPS".to_string(), "UPS".to_string(), "Fans".to_string()];
        let updated = create_sheet(&doc, "Sala 2", &questions).expect("create");
        assert_eq!(doc.sheet_names(), vec!["Checklist Datacenter"]);
        assert_eq!(updated.sheet_names(), vec!["Checklist Datacenter", "Sala 2"]);

        let rows = updated.sheet_rows("Sala 2").expect("rows");
        assert_eq!(extract_checklist_column(&rows), vec!["UPS", "Fans"]);
        assert!(to_records(&rows).records.is_empty());
    }
}
