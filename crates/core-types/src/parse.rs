//! Conversions from raw, line-oriented user input into typed values.
//!
//! Every helper treats a blank answer as "not supplied". Required helpers turn that
//! into an error; optional helpers turn it into `None`. Anything supplied but
//! malformed is always an error, never silently dropped.

use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Returns the trimmed input, or `None` when it is blank.
pub fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

pub fn parse_text(field: &str, raw: &str) -> Result<String, CoreError> {
    non_blank(raw)
        .map(str::to_string)
        .ok_or_else(|| CoreError::invalid(field, "a value is required"))
}

pub fn parse_optional_text(raw: &str) -> Option<String> {
    non_blank(raw).map(str::to_string)
}

pub fn parse_number(field: &str, raw: &str) -> Result<f64, CoreError> {
    let value = non_blank(raw).ok_or_else(|| CoreError::invalid(field, "a number is required"))?;
    to_finite(field, value)
}

pub fn parse_optional_number(field: &str, raw: &str) -> Result<Option<f64>, CoreError> {
    non_blank(raw).map(|value| to_finite(field, value)).transpose()
}

/// Parses a surrogate id. Ids are assigned by the database starting at 1.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, CoreError> {
    let value = non_blank(raw).ok_or_else(|| CoreError::invalid(field, "an id is required"))?;
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(CoreError::invalid(field, "ids are positive integers")),
        Err(_) => Err(CoreError::invalid(field, format!("'{}' is not an integer", value))),
    }
}

pub fn parse_optional_date(field: &str, raw: &str) -> Result<Option<NaiveDate>, CoreError> {
    non_blank(raw)
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| CoreError::invalid(field, format!("'{}' is not a YYYY-MM-DD date", value)))
        })
        .transpose()
}

pub fn parse_optional_timestamp(field: &str, raw: &str) -> Result<Option<NaiveDateTime>, CoreError> {
    non_blank(raw).map(|value| parse_timestamp(field, value)).transpose()
}

pub fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, CoreError> {
    let value = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| CoreError::invalid(field, format!("'{}' is not a YYYY-MM-DD HH:MM:SS timestamp", value)))
}

/// Parses any enum-like value whose `FromStr` reports a `CoreError`.
pub fn parse_optional<T>(raw: &str) -> Result<Option<T>, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    non_blank(raw).map(T::from_str).transpose()
}

/// Rejects NaN and infinities as well as non-numeric text.
pub fn ensure_finite(field: &str, value: f64) -> Result<f64, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::invalid(field, "must be a finite number"))
    }
}

fn to_finite(field: &str, value: &str) -> Result<f64, CoreError> {
    let number = value
        .parse::<f64>()
        .map_err(|_| CoreError::invalid(field, format!("'{}' is not a number", value)))?;
    ensure_finite(field, number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::SensorKind;

    #[test]
    fn blank_optional_values_are_none() {
        assert_eq!(parse_optional_number("size", "   ").unwrap(), None);
        assert_eq!(parse_optional_text(""), None);
        assert_eq!(parse_optional::<SensorKind>("").unwrap(), None);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = parse_number("ph_min", "six").unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "ph_min"));
        assert!(parse_number("value", "NaN").is_err());
        assert!(parse_optional_number("size", "inf").is_err());
        assert_eq!(parse_number("value", " 6.5 ").unwrap(), 6.5);
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("id", "12").unwrap(), 12);
        assert!(parse_id("id", "0").is_err());
        assert!(parse_id("id", "1.5").is_err());
        assert!(parse_id("id", "").is_err());
    }

    #[test]
    fn timestamps_accept_space_or_t_separator() {
        let a = parse_timestamp("timestamp", "2024-05-01 10:30:00").unwrap();
        let b = parse_timestamp("timestamp", "2024-05-01T10:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_optional_timestamp("timestamp", "yesterday").is_err());
    }

    #[test]
    fn required_text_rejects_whitespace() {
        assert!(parse_text("name", "  \t").is_err());
        assert_eq!(parse_text("name", " Ana ").unwrap(), "Ana");
    }
}
