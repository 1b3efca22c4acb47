use std::fmt::Write as _;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cell_ref::{column_letters, parse_cell_ref};
use crate::shared_strings::read_text;
use crate::XlsxError;

/// A worksheet as rows of cell text, row 0 first. Rows may be ragged and gaps in
/// the source (skipped rows or columns) are filled with empty strings.
pub type SheetRows = Vec<Vec<String>>;

const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

pub(crate) fn parse_worksheet_rows(
    xml: &[u8],
    shared_strings: &[String],
) -> Result<SheetRows, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut rows: SheetRows = Vec::new();
    let mut current_row: Option<usize> = None;
    let mut next_row = 0usize;
    let mut next_col = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let row = row_index(&e)?.unwrap_or(next_row);
                current_row = Some(row);
                next_row = row + 1;
                next_col = 0;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                next_row = row_index(&e)?.unwrap_or(next_row) + 1;
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => current_row = None,
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (pos, kind) = cell_attrs(&e, current_row.unwrap_or(next_row), next_col)?;
                let value = read_cell_value(&mut reader, kind.as_deref(), shared_strings)?;
                next_col = pos.1 + 1;
                set_cell(&mut rows, pos, value)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let (pos, _) = cell_attrs(&e, current_row.unwrap_or(next_row), next_col)?;
                next_col = pos.1 + 1;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn row_index(e: &BytesStart<'_>) -> Result<Option<usize>, XlsxError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"r" {
            let r = attr.unescape_value()?;
            return Ok(r.trim().parse::<usize>().ok().filter(|r| *r > 0).map(|r| r - 1));
        }
    }
    Ok(None)
}

fn cell_attrs(
    e: &BytesStart<'_>,
    fallback_row: usize,
    fallback_col: usize,
) -> Result<((usize, usize), Option<String>), XlsxError> {
    let mut pos = (fallback_row, fallback_col);
    let mut kind = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"r" => {
                let a1 = attr.unescape_value()?;
                let (row, col) = parse_cell_ref(&a1)
                    .ok_or_else(|| XlsxError::Invalid(format!("invalid cell reference `{a1}`")))?;
                pos = (row as usize, col as usize);
            }
            b"t" => kind = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok((pos, kind))
}

fn read_cell_value<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    kind: Option<&str>,
    shared_strings: &[String],
) -> Result<String, XlsxError> {
    let mut buf = Vec::new();
    let mut value: Option<String> = None;
    let mut inline: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                value = Some(read_text(reader, b"v")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"is" => {
                inline = Some(read_inline_string(reader)?);
            }
            // Formulas (`<f>`) and extensions carry nothing we display.
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => {
                return Err(XlsxError::Invalid(
                    "unexpected EOF while parsing cell <c>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    let text = match kind {
        Some("s") => {
            let raw = value.unwrap_or_default();
            match raw.trim().parse::<usize>().ok().and_then(|idx| shared_strings.get(idx)) {
                Some(s) => s.clone(),
                None => {
                    log::warn!("shared string index `{raw}` is out of range; reading as empty");
                    String::new()
                }
            }
        }
        Some("inlineStr") => inline.or(value).unwrap_or_default(),
        Some("b") => match value.as_deref().map(str::trim) {
            Some("1") => "TRUE".to_string(),
            Some(_) => "FALSE".to_string(),
            None => String::new(),
        },
        _ => value.unwrap_or_default(),
    };
    Ok(text)
}

fn read_inline_string<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<String, XlsxError> {
    let mut buf = Vec::new();
    let mut out = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                out.push_str(&read_text(reader, b"t")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"is" => break,
            Event::Eof => {
                return Err(XlsxError::Invalid(
                    "unexpected EOF while parsing inline string <is>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn set_cell(
    rows: &mut SheetRows,
    (row, col): (usize, usize),
    value: String,
) -> Result<(), XlsxError> {
    if row >= MAX_ROWS || col >= MAX_COLS {
        return Err(XlsxError::Invalid(format!(
            "cell at row {} column {} is outside the worksheet grid",
            row + 1,
            col + 1
        )));
    }
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize_with(col + 1, String::new);
    }
    cells[col] = value;
    Ok(())
}

/// Serialize rows as a worksheet part using inline strings.
///
/// Empty cells are omitted; `col_widths[i]` (in characters) applies to column `i`.
pub(crate) fn write_worksheet_xml(rows: &[Vec<String>], col_widths: &[f64]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<worksheet xmlns=""#);
    out.push_str(SPREADSHEETML_NS);
    out.push_str(r#"">"#);

    if !col_widths.is_empty() {
        out.push_str("<cols>");
        for (idx, width) in col_widths.iter().enumerate() {
            let _ = write!(
                out,
                r#"<col min="{n}" max="{n}" width="{width}" customWidth="1"/>"#,
                n = idx + 1
            );
        }
        out.push_str("</cols>");
    }

    out.push_str("<sheetData>");
    for (row_idx, row) in rows.iter().enumerate() {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row_num = row_idx + 1;
        let _ = write!(out, r#"<row r="{row_num}">"#);
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let _ = write!(
                out,
                r#"<c r="{}{row_num}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_letters(col_idx as u32),
                escape_text(cell)
            );
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData>");
    out.push_str("</worksheet>\n");
    out
}

pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' | '\n' | '\r' => out.push(c),
            // XML 1.0 cannot carry other C0 controls at all.
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&apos;")
}
