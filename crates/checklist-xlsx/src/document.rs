use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::content::{
    attr_eq, blank_content_types_xml, blank_root_rels_xml, blank_styles_xml,
    blank_workbook_rels_xml, blank_workbook_xml, insert_last_child, next_relationship_id,
    override_element, parse_relationships, parse_workbook_sheets, rels_part_for,
    remove_empty_elements, resolve_target, sheet_element, write_relationships, Relationship,
    CONTENT_TYPES_PART, CONTENT_TYPE_WORKSHEET, DEFAULT_WORKBOOK_PART, REL_TYPE_CALC_CHAIN,
    REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SHARED_STRINGS, REL_TYPE_WORKSHEET, ROOT_RELS_PART,
};
use crate::shared_strings::parse_shared_strings;
use crate::sheet_name::{sheet_name_eq_case_insensitive, validate_sheet_name};
use crate::worksheet::{parse_worksheet_rows, write_worksheet_xml, SheetRows};
use crate::zip_util::{read_part_with_budget, ZipInflateBudget, MAX_PART_BYTES, MAX_TOTAL_BYTES};
use crate::XlsxError;

/// One worksheet as listed in `workbook.xml`, in tab order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
    /// Resolved part name, e.g. `xl/worksheets/sheet1.xml`.
    pub part: String,
}

/// An XLSX package held in memory as part name -> bytes.
#[derive(Debug, Clone)]
pub struct SpreadsheetDocument {
    parts: BTreeMap<String, Vec<u8>>,
    workbook_part: String,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
}

impl SpreadsheetDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XlsxError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = BTreeMap::new();
        let mut budget = ZipInflateBudget::new(MAX_TOTAL_BYTES);
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let declared = file.size();
            let buf =
                read_part_with_budget(&mut file, declared, &name, MAX_PART_BYTES, &mut budget)?;
            parts.insert(name, buf);
        }
        Self::from_parts(parts)
    }

    /// A workbook with a single empty worksheet.
    pub fn new_blank(sheet_name: &str) -> Result<Self, XlsxError> {
        validate_sheet_name(sheet_name).map_err(|reason| XlsxError::InvalidSheetName {
            name: sheet_name.to_string(),
            reason,
        })?;

        let mut parts = BTreeMap::new();
        parts.insert(CONTENT_TYPES_PART.to_string(), blank_content_types_xml().into_bytes());
        parts.insert(ROOT_RELS_PART.to_string(), blank_root_rels_xml().into_bytes());
        parts.insert(
            DEFAULT_WORKBOOK_PART.to_string(),
            blank_workbook_xml(sheet_name).into_bytes(),
        );
        parts.insert(rels_part_for(DEFAULT_WORKBOOK_PART), blank_workbook_rels_xml().into_bytes());
        parts.insert("xl/styles.xml".to_string(), blank_styles_xml().into_bytes());
        parts.insert(
            "xl/worksheets/sheet1.xml".to_string(),
            write_worksheet_xml(&[], &[]).into_bytes(),
        );
        Self::from_parts(parts)
    }

    fn from_parts(parts: BTreeMap<String, Vec<u8>>) -> Result<Self, XlsxError> {
        let workbook_part = match lookup(&parts, ROOT_RELS_PART) {
            Some(xml) => parse_relationships(xml)?
                .into_iter()
                .find(|rel| rel.rel_type == REL_TYPE_OFFICE_DOCUMENT && !rel.is_external())
                .map(|rel| resolve_target("", &rel.target))
                .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()),
            None => DEFAULT_WORKBOOK_PART.to_string(),
        };
        let workbook_xml = lookup(&parts, &workbook_part)
            .ok_or_else(|| XlsxError::MissingPart(workbook_part.clone()))?;
        let rels = match lookup(&parts, &rels_part_for(&workbook_part)) {
            Some(xml) => parse_relationships(xml)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::new();
        for parsed in parse_workbook_sheets(workbook_xml)? {
            let rel = rels
                .iter()
                .find(|rel| rel.id == parsed.rel_id && !rel.is_external())
                .ok_or_else(|| {
                    XlsxError::Invalid(format!(
                        "sheet `{}` points at missing relationship `{}`",
                        parsed.name, parsed.rel_id
                    ))
                })?;
            sheets.push(SheetEntry {
                name: parsed.name,
                sheet_id: parsed.sheet_id,
                rel_id: parsed.rel_id,
                part: resolve_target(&workbook_part, &rel.target),
            });
        }

        let shared_strings = match rels
            .iter()
            .find(|rel| rel.rel_type == REL_TYPE_SHARED_STRINGS)
            .map(|rel| resolve_target(&workbook_part, &rel.target))
            .and_then(|part| lookup(&parts, &part))
        {
            Some(xml) => parse_shared_strings(xml)?,
            None => Vec::new(),
        };

        log::debug!(
            "loaded workbook with {} parts and sheets {:?}",
            parts.len(),
            sheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            parts,
            workbook_part,
            sheets,
            shared_strings,
        })
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Exact name match first, then case-insensitive.
    pub fn sheet(&self, name: &str) -> Option<&SheetEntry> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.sheets.iter().find(|s| sheet_name_eq_case_insensitive(&s.name, name)))
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        lookup(&self.parts, name)
    }

    pub fn sheet_rows(&self, name: &str) -> Result<SheetRows, XlsxError> {
        let sheet = self
            .sheet(name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;
        let xml = self
            .part(&sheet.part)
            .ok_or_else(|| XlsxError::MissingPart(sheet.part.clone()))?;
        parse_worksheet_rows(xml, &self.shared_strings)
    }

    /// Rewrite one worksheet's cells. Other parts keep their bytes; the workbook's
    /// calculation chain is dropped since it may reference cells that no longer exist.
    pub fn replace_sheet_rows(
        &mut self,
        name: &str,
        rows: &[Vec<String>],
        col_widths: &[f64],
    ) -> Result<(), XlsxError> {
        let part = self
            .sheet(name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?
            .part
            .clone();
        let key = part_key(&self.parts, &part).unwrap_or(part);
        self.parts
            .insert(key, write_worksheet_xml(rows, col_widths).into_bytes());
        self.drop_calc_chain()
    }

    /// Append a worksheet holding `rows` after the existing tabs.
    pub fn add_sheet(
        &mut self,
        name: &str,
        rows: &[Vec<String>],
        col_widths: &[f64],
    ) -> Result<(), XlsxError> {
        validate_sheet_name(name).map_err(|reason| XlsxError::InvalidSheetName {
            name: name.to_string(),
            reason,
        })?;
        if self
            .sheets
            .iter()
            .any(|s| sheet_name_eq_case_insensitive(&s.name, name))
        {
            return Err(XlsxError::DuplicateSheetName(name.to_string()));
        }

        let rels_part = rels_part_for(&self.workbook_part);
        let mut rels = match self.part(&rels_part) {
            Some(xml) => parse_relationships(xml)?,
            None => Vec::new(),
        };
        let rel_id = next_relationship_id(&rels);
        let sheet_id = self.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        let mut n = self.sheets.len() + 1;
        let (target, part) = loop {
            let target = format!("worksheets/sheet{n}.xml");
            let part = resolve_target(&self.workbook_part, &target);
            if self.part(&part).is_none() {
                break (target, part);
            }
            n += 1;
        };

        // Build every patched part before touching `self` so a failure leaves it intact.
        let workbook_xml = self
            .part(&self.workbook_part)
            .ok_or_else(|| XlsxError::MissingPart(self.workbook_part.clone()))?;
        let workbook_xml = insert_last_child(workbook_xml, b"sheets", |prefix| {
            sheet_element(prefix, name, sheet_id, &rel_id)
        })?;
        rels.push(Relationship {
            id: rel_id.clone(),
            rel_type: REL_TYPE_WORKSHEET.to_string(),
            target,
            target_mode: None,
        });
        let content_types = self
            .part(CONTENT_TYPES_PART)
            .ok_or_else(|| XlsxError::MissingPart(CONTENT_TYPES_PART.to_string()))?;
        let content_types = insert_last_child(content_types, b"Types", |prefix| {
            override_element(prefix, &part, CONTENT_TYPE_WORKSHEET)
        })?;

        let workbook_part = self.workbook_part.clone();
        self.put_part(&workbook_part, workbook_xml);
        self.put_part(&rels_part, write_relationships(&rels).into_bytes());
        self.put_part(CONTENT_TYPES_PART, content_types);
        self.put_part(&part, write_worksheet_xml(rows, col_widths).into_bytes());
        self.sheets.push(SheetEntry {
            name: name.to_string(),
            sheet_id,
            rel_id,
            part,
        });
        log::debug!("added sheet `{name}` (sheetId {sheet_id})");
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, XlsxError> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options =
                FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

            // Readers sniff `[Content_Types].xml` first; keep it at the front.
            if let Some(content_types) = self.parts.get(CONTENT_TYPES_PART) {
                zip.start_file(CONTENT_TYPES_PART, options)?;
                zip.write_all(content_types)?;
            }
            for (name, bytes) in &self.parts {
                if name == CONTENT_TYPES_PART {
                    continue;
                }
                zip.start_file(name.as_str(), options)?;
                zip.write_all(bytes)?;
            }
            zip.finish()?;
        }
        Ok(buffer.into_inner())
    }

    fn put_part(&mut self, name: &str, bytes: Vec<u8>) {
        let key = part_key(&self.parts, name).unwrap_or_else(|| name.to_string());
        self.parts.insert(key, bytes);
    }

    fn drop_calc_chain(&mut self) -> Result<(), XlsxError> {
        let rels_part = rels_part_for(&self.workbook_part);
        let Some(rels_xml) = self.part(&rels_part) else {
            return Ok(());
        };
        let (calc_chain, kept): (Vec<Relationship>, Vec<Relationship>) =
            parse_relationships(rels_xml)?
                .into_iter()
                .partition(|rel| rel.rel_type == REL_TYPE_CALC_CHAIN);
        if calc_chain.is_empty() {
            return Ok(());
        }

        let dropped: Vec<String> = calc_chain
            .iter()
            .map(|rel| resolve_target(&self.workbook_part, &rel.target))
            .collect();
        if let Some(xml) = self.part(CONTENT_TYPES_PART) {
            let content_types = remove_empty_elements(xml, b"Override", |e| {
                for part in &dropped {
                    if attr_eq(e, b"PartName", &format!("/{part}"))? {
                        return Ok(true);
                    }
                }
                Ok(false)
            })?;
            self.put_part(CONTENT_TYPES_PART, content_types);
        }
        for part in &dropped {
            if let Some(key) = part_key(&self.parts, part) {
                self.parts.remove(&key);
            }
        }
        self.put_part(&rels_part, write_relationships(&kept).into_bytes());
        log::debug!("dropped calcChain after rewriting sheet data");
        Ok(())
    }
}

fn part_key(parts: &BTreeMap<String, Vec<u8>>, name: &str) -> Option<String> {
    if parts.contains_key(name) {
        return Some(name.to_string());
    }
    parts.keys().find(|key| key.eq_ignore_ascii_case(name)).cloned()
}

fn lookup<'a>(parts: &'a BTreeMap<String, Vec<u8>>, name: &str) -> Option<&'a [u8]> {
    match parts.get(name) {
        Some(bytes) => Some(bytes.as_slice()),
        None => parts
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, bytes)| bytes.as_slice()),
    }
}
