//! XLSX workbooks as sheets of string rows.
//!
//! [`SpreadsheetDocument`] keeps every part of the Open Packaging Convention (OPC)
//! ZIP in memory and only understands enough SpreadsheetML to:
//! - enumerate worksheets in tab order
//! - read a worksheet into a dense `Vec<Vec<String>>` (shared strings, inline
//!   strings, numbers and booleans resolved to text)
//! - replace one worksheet's cells while leaving every other part untouched
//! - append a new worksheet
//!
//! Anything richer (styles, formulas, charts) is preserved byte-for-byte on
//! sheets that are not rewritten and dropped on sheets that are.

mod cell_ref;
mod content;
mod document;
mod error;
mod shared_strings;
mod sheet_name;
mod worksheet;
mod zip_util;

pub use cell_ref::{column_letters, parse_cell_ref};
pub use document::{SheetEntry, SpreadsheetDocument};
pub use error::XlsxError;
pub use sheet_name::{
    sheet_name_eq_case_insensitive, validate_sheet_name, SheetNameError, MAX_SHEET_NAME_LEN,
};
pub use worksheet::SheetRows;
pub use zip_util::{MAX_PART_BYTES, MAX_TOTAL_BYTES};
