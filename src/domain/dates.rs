//! Date conversion rules
//!
//! Papers3 stores publication dates as a fixed-width digit string:
//! a `99` sentinel, then `YYYYMMDDHHMMSS`, then padding. Month and day are
//! often `00` when only the year is known. These helpers turn that encoding
//! (or the ISO strings some exports already contain) into the forms the
//! destination store expects.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const SENTINEL: &str = "99";
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Zotero's `dateAdded` / `dateModified` column format.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses the sentinel-prefixed encoding into `YYYY-MM-DDTHH:MM:SS`.
///
/// Month or day of zero is read as 1. A year outside 1900..=2100, or a
/// month/day/time that does not form a real date, degrades to January 1 of
/// the encoded year instead of failing. Strings without the sentinel, or
/// shorter than the encoding, return `None`.
///
/// # Examples
///
/// ```
/// use papers3_zotero::domain::dates::parse_encoded_date;
///
/// assert_eq!(
///     parse_encoded_date("99200500000000000000000222000").as_deref(),
///     Some("2005-01-01T00:00:00")
/// );
/// ```
pub fn parse_encoded_date(raw: &str) -> Option<String> {
    if !raw.starts_with(SENTINEL) || raw.len() < 16 || !raw.is_char_boundary(16) {
        return None;
    }
    let digits = &raw[2..16];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let field = |range: std::ops::Range<usize>| -> u32 {
        digits[range].parse().unwrap_or(0)
    };
    let year = digits[0..4].parse::<i32>().ok()?;
    let mut month = field(4..6);
    let mut day = field(6..8);
    let (hour, minute, second) = (field(8..10), field(10..12), field(12..14));

    if month == 0 {
        month = 1;
    }
    if day == 0 {
        day = 1;
    }

    let fallback = || format!("{year:04}-01-01T00:00:00");
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) || month > 12 || day > 31 {
        return Some(fallback());
    }

    let parsed = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second));
    Some(match parsed {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => fallback(),
    })
}

/// Converts a publication date into the value stored in the `date` field.
///
/// Encoded and ISO datetimes become `YYYY-MM-DD`; a bare year is kept as is;
/// anything else is passed through untouched. Empty input yields `None`.
pub fn publication_date_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(iso) = parse_encoded_date(raw) {
        return Some(iso[..10].to_string());
    }
    if raw.contains('T') {
        if let Some(dt) = parse_iso(raw) {
            return Some(dt.format("%Y-%m-%d").to_string());
        }
    }
    Some(raw.to_string())
}

/// Extracts the four-digit year from an encoded, ISO, or year-prefixed date.
pub fn extract_year(raw: &str) -> Option<i32> {
    let normalized = parse_encoded_date(raw).unwrap_or_else(|| raw.trim().to_string());
    let prefix = normalized.get(0..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Normalizes a creation/modification timestamp to [`STORE_TIMESTAMP_FORMAT`].
///
/// Falls back to the current time when the value is missing or unparseable.
pub fn store_timestamp(raw: Option<&str>) -> String {
    raw.and_then(parse_iso)
        .unwrap_or_else(|| Utc::now().naive_utc())
        .format(STORE_TIMESTAMP_FORMAT)
        .to_string()
}

fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    None
}
