//! Package-level SpreadsheetML parts: `workbook.xml`, relationships and
//! `[Content_Types].xml`, plus the templates for a fresh workbook.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::worksheet::escape_attr;
use crate::XlsxError;

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS_PART: &str = "_rels/.rels";
pub(crate) const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

pub(crate) const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub(crate) const REL_TYPE_CALC_CHAIN: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";
const REL_TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const CONTENT_TYPE_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.target_mode
            .as_deref()
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("External"))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedSheet {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
}

pub(crate) fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut rels = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref().eq_ignore_ascii_case(b"Relationship") =>
            {
                let mut id = None;
                let mut rel_type = None;
                let mut target = None;
                let mut target_mode = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = attr.key.local_name();
                    let key = key.as_ref();
                    if key.eq_ignore_ascii_case(b"Id") {
                        id = Some(attr.unescape_value()?.into_owned());
                    } else if key.eq_ignore_ascii_case(b"Type") {
                        rel_type = Some(attr.unescape_value()?.into_owned());
                    } else if key.eq_ignore_ascii_case(b"Target") {
                        target = Some(attr.unescape_value()?.into_owned());
                    } else if key.eq_ignore_ascii_case(b"TargetMode") {
                        target_mode = Some(attr.unescape_value()?.into_owned());
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.push(Relationship {
                        id,
                        rel_type: rel_type.unwrap_or_default(),
                        target,
                        target_mode,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

pub(crate) fn write_relationships(rels: &[Relationship]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Relationships xmlns=""#);
    out.push_str(PACKAGE_RELATIONSHIPS_NS);
    out.push_str(r#"">"#);
    for rel in rels {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            escape_attr(&rel.id),
            escape_attr(&rel.rel_type),
            escape_attr(&rel.target)
        ));
        if let Some(mode) = &rel.target_mode {
            out.push_str(&format!(r#" TargetMode="{}""#, escape_attr(mode)));
        }
        out.push_str("/>");
    }
    out.push_str("</Relationships>\n");
    out
}

/// First unused `rId{n}`.
pub(crate) fn next_relationship_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|rel| rel.id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

pub(crate) fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<ParsedSheet>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut sheet_id = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
                        (false, b"name") => name = Some(attr.unescape_value()?.into_owned()),
                        (false, b"sheetId") => {
                            sheet_id = attr.unescape_value()?.trim().parse::<u32>().ok()
                        }
                        (true, b"id") => rel_id = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                let (Some(name), Some(rel_id)) = (name, rel_id) else {
                    return Err(XlsxError::Invalid(
                        "workbook.xml <sheet> is missing `name` or `r:id`".to_string(),
                    ));
                };
                sheets.push(ParsedSheet {
                    name,
                    sheet_id: sheet_id.unwrap_or(0),
                    rel_id,
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Resolve a relationship target against the part that owns the relationship.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rfind('/') {
        Some(idx) => source_part[..idx].split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relationship part for `part`: `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`.
pub(crate) fn rels_part_for(part: &str) -> String {
    match part.rfind('/') {
        Some(idx) => format!("{}/_rels/{}.rels", &part[..idx], &part[idx + 1..]),
        None => format!("_rels/{part}.rels"),
    }
}

/// Insert markup as the last child of the first element named `local`.
///
/// `child` receives the element's namespace prefix (`"x:"` or `""`) so the new
/// child lands in the same namespace as its parent.
pub(crate) fn insert_last_child(
    xml: &[u8],
    local: &[u8],
    child: impl FnOnce(&str) -> String,
) -> Result<Vec<u8>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf)? {
            Event::End(e) if e.local_name().as_ref() == local => {
                let prefix = qualified_prefix(e.name().as_ref());
                let mut out = Vec::with_capacity(xml.len() + 128);
                out.extend_from_slice(&xml[..before]);
                out.extend_from_slice(child(&prefix).as_bytes());
                out.extend_from_slice(&xml[before..]);
                return Ok(out);
            }
            Event::Empty(e) if e.local_name().as_ref() == local => {
                let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let prefix = qualified_prefix(e.name().as_ref());
                let after = reader.buffer_position() as usize;
                let mut out = Vec::with_capacity(xml.len() + 128);
                out.extend_from_slice(&xml[..before]);
                out.extend_from_slice(format!("<{qname}>{}</{qname}>", child(&prefix)).as_bytes());
                out.extend_from_slice(&xml[after..]);
                return Ok(out);
            }
            Event::Eof => {
                return Err(XlsxError::Invalid(format!(
                    "missing <{}> element",
                    String::from_utf8_lossy(local)
                )))
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Drop every empty element named `local` for which `matches` returns true.
pub(crate) fn remove_empty_elements(
    xml: &[u8],
    local: &[u8],
    mut matches: impl FnMut(&BytesStart<'_>) -> Result<bool, XlsxError>,
) -> Result<Vec<u8>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut out = Vec::with_capacity(xml.len());
    let mut copied_up_to = 0usize;
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if e.local_name().as_ref() == local && matches(&e)? => {
                out.extend_from_slice(&xml[copied_up_to..before]);
                copied_up_to = reader.buffer_position() as usize;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    out.extend_from_slice(&xml[copied_up_to..]);
    Ok(out)
}

pub(crate) fn attr_eq(e: &BytesStart<'_>, key: &[u8], expected: &str) -> Result<bool, XlsxError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(attr.unescape_value()?.as_ref() == expected);
        }
    }
    Ok(false)
}

fn qualified_prefix(qname: &[u8]) -> String {
    match qname.iter().position(|b| *b == b':') {
        Some(idx) => format!("{}:", String::from_utf8_lossy(&qname[..idx])),
        None => String::new(),
    }
}

pub(crate) fn sheet_element(prefix: &str, name: &str, sheet_id: u32, rel_id: &str) -> String {
    format!(
        r#"<{prefix}sheet xmlns:r="{RELATIONSHIPS_NS}" name="{}" sheetId="{sheet_id}" r:id="{}"/>"#,
        escape_attr(name),
        escape_attr(rel_id)
    )
}

pub(crate) fn override_element(prefix: &str, part: &str, content_type: &str) -> String {
    format!(
        r#"<{prefix}Override PartName="/{}" ContentType="{}"/>"#,
        escape_attr(part),
        escape_attr(content_type)
    )
}

pub(crate) fn blank_content_types_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>
"#
    .to_owned()
}

pub(crate) fn blank_root_rels_xml() -> String {
    write_relationships(&[Relationship {
        id: "rId1".to_string(),
        rel_type: REL_TYPE_OFFICE_DOCUMENT.to_string(),
        target: DEFAULT_WORKBOOK_PART.to_string(),
        target_mode: None,
    }])
}

pub(crate) fn blank_workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="{}" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>
"#,
        escape_attr(sheet_name)
    )
}

pub(crate) fn blank_workbook_rels_xml() -> String {
    write_relationships(&[
        Relationship {
            id: "rId1".to_string(),
            rel_type: REL_TYPE_WORKSHEET.to_string(),
            target: "worksheets/sheet1.xml".to_string(),
            target_mode: None,
        },
        Relationship {
            id: "rId2".to_string(),
            rel_type: REL_TYPE_STYLES.to_string(),
            target: "styles.xml".to_string(),
            target_mode: None,
        },
    ])
}

pub(crate) fn blank_styles_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>
"#
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_targets() {
        let cases = [
            ("xl/workbook.xml", "worksheets/sheet1.xml", "xl/worksheets/sheet1.xml"),
            ("xl/workbook.xml", "/xl/worksheets/sheet2.xml", "xl/worksheets/sheet2.xml"),
            ("xl/workbook.xml", "./sharedStrings.xml", "xl/sharedStrings.xml"),
            ("xl/worksheets/sheet1.xml", "../drawings/d1.xml", "xl/drawings/d1.xml"),
        ];
        for (source, target, expected) in cases {
            assert_eq!(resolve_target(source, target), expected, "{source} -> {target}");
        }
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
    }

    #[test]
    fn rels_part_sits_next_to_its_source() {
        assert_eq!(rels_part_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(rels_part_for("workbook.xml"), "_rels/workbook.xml.rels");
    }

    #[test]
    fn next_relationship_id_skips_used_ids() {
        let rels = parse_relationships(blank_workbook_rels_xml().as_bytes()).expect("parse rels");
        assert_eq!(rels.len(), 2);
        assert_eq!(next_relationship_id(&rels), "rId3");
        assert_eq!(next_relationship_id(&[]), "rId1");
    }

    #[test]
    fn insert_last_child_keeps_the_parent_prefix() {
        let xml =
            br#"<x:workbook xmlns:x="main"><x:sheets><x:sheet name="A"/></x:sheets></x:workbook>"#;
        let out = insert_last_child(xml, b"sheets", |p| format!("<{p}sheet name=\"B\"/>"))
            .expect("insert");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            concat!(
                r#"<x:workbook xmlns:x="main"><x:sheets>"#,
                r#"<x:sheet name="A"/><x:sheet name="B"/>"#,
                r#"</x:sheets></x:workbook>"#,
            )
        );
    }

    #[test]
    fn insert_last_child_expands_empty_parents() {
        let out =
            insert_last_child(b"<Types><Defaults/></Types>", b"Defaults", |_| "<D/>".to_string())
                .expect("insert");
        assert_eq!(out, b"<Types><Defaults><D/></Defaults></Types>");
    }

    #[test]
    fn remove_empty_elements_drops_only_matches() {
        let xml = concat!(
            r#"<Types><Override PartName="/xl/calcChain.xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml"/></Types>"#,
        );
        let out = remove_empty_elements(xml.as_bytes(), b"Override", |e| {
            attr_eq(e, b"PartName", "/xl/calcChain.xml")
        })
        .expect("remove");
        assert_eq!(out, br#"<Types><Override PartName="/xl/workbook.xml"/></Types>"#.to_vec());
    }

    #[test]
    fn parses_sheets_with_prefixed_relationship_ids() {
        let sheets = parse_workbook_sheets(blank_workbook_xml("Checklist & Co").as_bytes())
            .expect("parse workbook");
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Checklist & Co");
        assert_eq!(sheets[0].sheet_id, 1);
        assert_eq!(sheets[0].rel_id, "rId1");
    }
}
