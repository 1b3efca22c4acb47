#![allow(dead_code)]

use checklist_engine::FixedClock;
use checklist_xlsx::SpreadsheetDocument;
use chrono::NaiveDate;

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

/// 01/03/2024 08:15:00
pub fn clock() -> FixedClock {
    let now = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(8, 15, 0))
        .expect("valid timestamp");
    FixedClock(now)
}

/// A workbook whose `Checklist Datacenter` sheet has two records and no
/// `ChecklistItems` column, next to an unrelated `Notes` sheet.
pub fn legacy_workbook() -> Vec<u8> {
    let mut doc = SpreadsheetDocument::new_blank("Notes").expect("blank workbook");
    doc.replace_sheet_rows("Notes", &[row(&["keep me"])], &[])
        .expect("notes sheet");
    doc.add_sheet(
        "Checklist Datacenter",
        &[
            row(&["Data", "Hora", "Técnico", "Item Verificado", "Status", "Observações"]),
            row(&["28/02/2024", "17:00:00", "Bruno", "Physical Cleaning", "OK", "Nenhuma"]),
            row(&[
                "29/02/2024",
                "07:45:10",
                "Carla",
                "Temperature/Humidity",
                "ALERTA",
                "hot aisle 27C",
            ]),
        ],
        &[],
    )
    .expect("checklist sheet");
    doc.to_bytes().expect("encode workbook")
}
