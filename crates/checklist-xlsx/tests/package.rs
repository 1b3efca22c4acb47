use std::io::{Cursor, Write};

use checklist_xlsx::{SpreadsheetDocument, XlsxError};
use pretty_assertions::assert_eq;
use zip::write::FileOptions;
use zip::ZipWriter;

/// A workbook shaped like what desktop spreadsheet apps write: shared strings,
/// a prefixed main namespace, numeric serial dates, and an extra tab.
fn excel_style_package() -> Vec<u8> {
    let parts: &[(&str, &str)] = &[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<x:workbook xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><x:sheets><x:sheet name="Resumo" sheetId="1" r:id="rId1"/><x:sheet name="Checklist Datacenter" sheetId="4" r:id="rId2"/></x:sheets></x:workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#,
        ),
        (
            "xl/sharedStrings.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="5"><si><t>Data</t></si><si><t>Nome</t></si><si><t>Ana</t></si><si><r><t>Limpeza </t></r><r><t>Física</t></r></si><si><t>OK</t></si></sst>"#,
        ),
        (
            "xl/worksheets/sheet1.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:sheetData/></x:worksheet>"#,
        ),
        (
            "xl/worksheets/sheet2.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:sheetData><x:row r="1"><x:c r="A1" t="s"><x:v>0</x:v></x:c><x:c r="C1" t="s"><x:v>1</x:v></x:c></x:row><x:row r="3"><x:c r="A3"><x:v>45000</x:v></x:c><x:c r="C3" t="s"><x:v>2</x:v></x:c><x:c r="D3" t="s"><x:v>3</x:v></x:c><x:c r="E3" t="s"><x:v>4</x:v></x:c></x:row></x:sheetData></x:worksheet>"#,
        ),
    ];

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options =
            FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in parts {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(body.as_bytes()).expect("write part");
        }
        zip.finish().expect("finish zip");
    }
    buffer.into_inner()
}

fn strings(row: &[&str]) -> Vec<String> {
    row.iter().map(|s| s.to_string()).collect()
}

#[test]
fn reads_shared_strings_and_fills_gaps() {
    let doc = SpreadsheetDocument::from_bytes(&excel_style_package()).expect("open");
    assert_eq!(doc.sheet_names(), vec!["Resumo", "Checklist Datacenter"]);

    let rows = doc.sheet_rows("Checklist Datacenter").expect("rows");
    assert_eq!(
        rows,
        vec![
            strings(&["Data", "", "Nome"]),
            Vec::new(),
            strings(&["45000", "", "Ana", "Limpeza Física", "OK"]),
        ]
    );
    assert_eq!(doc.sheet_rows("Resumo").expect("rows"), Vec::<Vec<String>>::new());
}

#[test]
fn rewritten_sheet_survives_a_round_trip_and_keeps_other_tabs() {
    let mut doc = SpreadsheetDocument::from_bytes(&excel_style_package()).expect("open");
    let new_rows = vec![
        strings(&["Data", "Hora", "Nome"]),
        strings(&["01/03/2024", "08:15:00", "Zoë & <Ana>"]),
    ];
    doc.replace_sheet_rows("checklist datacenter", &new_rows, &[12.0, 10.0, 20.0])
        .expect("replace");

    let reopened =
        SpreadsheetDocument::from_bytes(&doc.to_bytes().expect("bytes")).expect("reopen");
    assert_eq!(reopened.sheet_names(), vec!["Resumo", "Checklist Datacenter"]);
    assert_eq!(reopened.sheet_rows("Checklist Datacenter").expect("rows"), new_rows);
    assert_eq!(
        reopened.part("xl/worksheets/sheet1.xml"),
        doc.part("xl/worksheets/sheet1.xml")
    );
}

#[test]
fn added_sheet_uses_prefixed_namespace_and_next_free_ids() {
    let mut doc = SpreadsheetDocument::from_bytes(&excel_style_package()).expect("open");
    doc.add_sheet("Sala 3", &[strings(&["Data"])], &[]).expect("add");

    let entry = doc.sheet("Sala 3").expect("added").clone();
    assert_eq!(entry.sheet_id, 5);
    assert_eq!(entry.rel_id, "rId4");
    assert_eq!(entry.part, "xl/worksheets/sheet3.xml");

    let workbook =
        String::from_utf8(doc.part("xl/workbook.xml").expect("workbook").to_vec()).expect("utf8");
    assert!(workbook.contains(r#"<x:sheet xmlns:r="#), "{workbook}");

    let reopened =
        SpreadsheetDocument::from_bytes(&doc.to_bytes().expect("bytes")).expect("reopen");
    assert_eq!(reopened.sheet_names(), vec!["Resumo", "Checklist Datacenter", "Sala 3"]);
    assert_eq!(reopened.sheet_rows("Sala 3").expect("rows"), vec![strings(&["Data"])]);
}

#[test]
fn missing_workbook_part_is_reported() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        zip.start_file("hello.txt", FileOptions::<()>::default()).expect("start");
        zip.write_all(b"hi").expect("write");
        zip.finish().expect("finish");
    }
    let err = SpreadsheetDocument::from_bytes(&buffer.into_inner()).expect_err("no workbook");
    assert!(
        matches!(err, XlsxError::MissingPart(ref part) if part == "xl/workbook.xml"),
        "{err:?}"
    );
}
