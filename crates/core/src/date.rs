//! Normalization of the catalog's heterogeneous date strings.
//!
//! The WordPress.org APIs return update and creation dates in several shapes
//! depending on item kind and field. Everything stored in the database uses
//! one canonical rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical rendering for timestamps (`last_updated`).
pub const CANONICAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical rendering for dates (`added_date`).
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const ISO_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%z";
const SPACED_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const DATE_ONLY: &str = "%Y-%m-%d";
// e.g. "2024-10-01 7:23pm GMT", as returned in plugin `last_updated`.
const HUMAN_GMT: &str = "%Y-%m-%d %I:%M%p GMT";

/// Output shape for [`normalize_date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// `YYYY-MM-DD`
    DateOnly,
}

/// Parse a catalog date string, trying each accepted format in order.
///
/// Offsets are discarded; the wall-clock fields are kept as written.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_str(input, ISO_WITH_OFFSET) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, SPACED_DATETIME) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_ONLY) {
        return date.and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(input, HUMAN_GMT).ok()
}

/// Re-render a catalog date string in the canonical stored format.
///
/// Returns `None` for empty input or input matching none of the accepted formats.
pub fn normalize_date(input: &str, style: DateStyle) -> Option<String> {
    let parsed = parse_date(input)?;
    let format = match style {
        DateStyle::DateTime => CANONICAL_DATETIME_FORMAT,
        DateStyle::DateOnly => CANONICAL_DATE_FORMAT,
    };
    Some(parsed.format(format).to_string())
}

/// Convenience wrapper for optional catalog fields.
pub fn normalize_optional(input: Option<&str>, style: DateStyle) -> Option<String> {
    input.and_then(|s| normalize_date(s, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_iso_with_offset() {
        assert_eq!(
            normalize_date("2023-05-17T08:30:00+0000", DateStyle::DateTime),
            Some("2023-05-17 08:30:00".to_string())
        );
        assert_eq!(
            normalize_date("2023-05-17T08:30:00+02:00", DateStyle::DateTime),
            Some("2023-05-17 08:30:00".to_string())
        );
    }

    #[test]
    fn test_spaced_datetime() {
        assert_eq!(
            normalize_date("2021-12-01 23:59:59", DateStyle::DateTime),
            Some("2021-12-01 23:59:59".to_string())
        );
        assert_eq!(
            normalize_date("2021-12-01 23:59:59", DateStyle::DateOnly),
            Some("2021-12-01".to_string())
        );
    }

    #[test]
    fn test_date_only() {
        assert_eq!(
            normalize_date("2010-03-04", DateStyle::DateOnly),
            Some("2010-03-04".to_string())
        );
        assert_eq!(
            normalize_date("2010-03-04", DateStyle::DateTime),
            Some("2010-03-04 00:00:00".to_string())
        );
    }

    #[test]
    fn test_human_gmt_form() {
        assert_eq!(
            normalize_date("2024-10-01 7:23pm GMT", DateStyle::DateTime),
            Some("2024-10-01 19:23:00".to_string())
        );
        assert_eq!(
            normalize_date("2024-10-01 12:05am GMT", DateStyle::DateTime),
            Some("2024-10-01 00:05:00".to_string())
        );
    }

    #[test]
    fn test_canonical_values_are_stable() {
        for input in ["2022-02-02 10:11:12", "2022-02-02"] {
            let once = normalize_date(input, DateStyle::DateTime).unwrap();
            let twice = normalize_date(&once, DateStyle::DateTime).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_empty_and_garbage_are_absent() {
        assert_eq!(normalize_date("", DateStyle::DateTime), None);
        assert_eq!(normalize_date("   ", DateStyle::DateOnly), None);
        assert_eq!(normalize_date("yesterday", DateStyle::DateTime), None);
        assert_eq!(normalize_date("2024-13-45", DateStyle::DateOnly), None);
        assert_eq!(normalize_date("01/02/2024", DateStyle::DateTime), None);
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None, DateStyle::DateOnly), None);
        assert_eq!(
            normalize_optional(Some("2019-07-08"), DateStyle::DateOnly),
            Some("2019-07-08".to_string())
        );
    }

    #[test]
    fn test_parse_date_year() {
        let parsed = parse_date("2020-06-30T12:00:00+0000").unwrap();
        assert_eq!(parsed.year(), 2020);
    }
}
