//! Common validation utilities for export requests.

use chrono::{Datelike, NaiveDate};
use validator::ValidationError;

/// Date format accepted on the wire (ISO calendar date).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Export formats accepted by the export endpoint.
pub const EXPORT_FORMATS: [&str; 3] = ["csv", "pdf", "xlsx"];

/// Default maximum span of an export period, in months.
pub const DEFAULT_MAX_SPAN_MONTHS: u32 = 12;

/// Validates that an export format is one of `csv`, `pdf` or `xlsx`.
///
/// Matching ignores surrounding whitespace and ASCII case.
pub fn validate_export_format(format: &str) -> Result<(), ValidationError> {
    let normalized = format.trim().to_ascii_lowercase();
    if EXPORT_FORMATS.contains(&normalized.as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("export_format");
        err.message = Some("Invalid format. Use one of: csv, pdf, xlsx".into());
        Err(err)
    }
}

/// Parses a strict `YYYY-MM-DD` calendar date.
///
/// Rejects anything that does not format back to the same string, so `2024-1-5`
/// and `2024-02-30` both fail.
pub fn parse_iso_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    let parsed = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|d| d.format(DATE_FORMAT).to_string() == value);

    parsed.ok_or_else(|| {
        let mut err = ValidationError::new("date_format");
        err.message = Some(format!("Invalid {}. Use the format YYYY-MM-DD", field).into());
        err
    })
}

/// Validates that `from` is not after `to`.
pub fn validate_date_order(from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
    if from <= to {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_order");
        err.message = Some("date_from cannot be later than date_to".into());
        Err(err)
    }
}

/// Number of whole calendar months between `from` and `to`.
///
/// Leftover days do not count, so `2023-01-15..2024-01-20` is 12 months.
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let months = i64::from(to.year() - from.year()) * 12 + i64::from(to.month())
        - i64::from(from.month());
    if to.day() < from.day() {
        months - 1
    } else {
        months
    }
}

/// Validates that the period `[from, to]` spans at most `max_months` whole months.
pub fn validate_date_span(
    from: NaiveDate,
    to: NaiveDate,
    max_months: u32,
) -> Result<(), ValidationError> {
    if whole_months_between(from, to) <= i64::from(max_months) {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_span");
        err.message = Some(format!("Maximum allowed period: {} months", max_months).into());
        Err(err)
    }
}

/// Validates that an optional identifier filter is a positive integer.
pub fn validate_positive_id(id: i64) -> Result<(), ValidationError> {
    if id > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("id_range");
        err.message = Some("Identifiers must be positive integers".into());
        Err(err)
    }
}
