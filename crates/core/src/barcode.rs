//! Barcode value rules shared by the importer and the allocator.
//!
//! A barcode is a plain token of 6 to 64 characters drawn from ASCII
//! letters, digits, `-` and `_`. Uniqueness is case-insensitive: `ab123456`
//! and `AB123456` are the same code.

use std::collections::HashSet;

/// Shortest accepted barcode.
pub const MIN_BARCODE_LEN: usize = 6;

/// Longest accepted barcode.
pub const MAX_BARCODE_LEN: usize = 64;

/// Return `true` if `value` is an acceptable barcode.
pub fn is_valid_barcode(value: &str) -> bool {
    let len = value.chars().count();
    (MIN_BARCODE_LEN..=MAX_BARCODE_LEN).contains(&len)
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Key used for case-insensitive comparisons, matching the `UPPER(code)`
/// unique index in storage.
pub fn dedup_key(code: &str) -> String {
    code.to_uppercase()
}

/// Drop case-insensitive duplicates, keeping the first occurrence and the
/// original order.
pub fn dedup_case_insensitive<I>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(dedup_key(code)))
        .collect()
}

/// Normalize a header cell for token matching: trim, uppercase, and strip
/// everything that is not alphanumeric.
pub fn normalize_header(cell: &str) -> String {
    cell.trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}
