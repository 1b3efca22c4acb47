use std::fmt;

/// Excel caps worksheet names at 31 characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetNameError {
    Empty,
    TooLong,
    ForbiddenCharacter(char),
    LeadingOrTrailingApostrophe,
}

impl fmt::Display for SheetNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetNameError::Empty => f.write_str("sheet name cannot be blank"),
            SheetNameError::TooLong => {
                write!(f, "sheet name cannot exceed {MAX_SHEET_NAME_LEN} characters")
            }
            SheetNameError::ForbiddenCharacter(c) => {
                write!(f, "sheet name cannot contain `{c}`")
            }
            SheetNameError::LeadingOrTrailingApostrophe => {
                f.write_str("sheet name cannot begin or end with an apostrophe")
            }
        }
    }
}

impl std::error::Error for SheetNameError {}

pub fn validate_sheet_name(name: &str) -> Result<(), SheetNameError> {
    if name.trim().is_empty() {
        return Err(SheetNameError::Empty);
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(SheetNameError::TooLong);
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(SheetNameError::ForbiddenCharacter(c));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(SheetNameError::LeadingOrTrailingApostrophe);
    }
    Ok(())
}

/// Sheet names compare case-insensitively (Unicode-aware, like Excel).
pub fn sheet_name_eq_case_insensitive(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
