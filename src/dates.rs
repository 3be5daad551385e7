//! Canonicalizes user-supplied date strings.

use chrono::NaiveDate;

/// Accepted input formats, tried in order. An input valid under more than
/// one format resolves to the first match; that tie-break is deliberate.
const ACCEPTED_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Returns the parsed date, or `None` when the input matches no accepted
/// format or is not a real calendar date. Callers treat `None` as a
/// validation failure; this never panics.
pub fn normalize_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}
