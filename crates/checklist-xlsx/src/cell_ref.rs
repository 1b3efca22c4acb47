/// Spreadsheet column letters for a 0-based column index (`0 -> A`, `26 -> AA`).
pub fn column_letters(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse an A1-style reference into 0-based `(row, col)`.
///
/// Absolute markers (`$B$2`) are accepted; anything else returns `None`.
pub fn parse_cell_ref(a1: &str) -> Option<(u32, u32)> {
    let s = a1.trim().replace('$', "");
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u64 = 0;
    for b in letters.bytes() {
        col = col * 26 + u64::from(b.to_ascii_uppercase() - b'A' + 1);
        if col > u64::from(u32::MAX) {
            return None;
        }
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, (col - 1) as u32))
}
