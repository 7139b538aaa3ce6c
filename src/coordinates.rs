//! Locale-aware coordinate string parsing.
//!
//! Sensor gateways report coordinates with `.` used both as the decimal
//! separator and as a thousands-group separator, e.g. `"6.123.456"`.
//! Only the first `.` marks the decimal point; every later one is a
//! grouping dot and is dropped before numeric parsing.

use regex::Regex;
use serde_json::Value;
use std::num::ParseFloatError;
use std::sync::LazyLock;
use thiserror::Error;

static INTEGER_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]*$").expect("valid integer pattern"));

static FRACTION_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*$").expect("valid fraction pattern"));

/// Reasons a coordinate string can be rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateParseError {
    #[error("empty coordinate string")]
    Empty,

    #[error("coordinate is missing or null")]
    Missing,

    #[error("expected a coordinate string, found {found}")]
    NotText { found: &'static str },

    #[error("unexpected characters in {part} part '{text}'")]
    InvalidCharacters { part: &'static str, text: String },

    #[error("no digits present")]
    NoDigits,

    #[error("not a number: {0}")]
    Unparsable(#[from] ParseFloatError),
}

/// Split a coordinate string into its integer and fractional digit runs.
///
/// The first segment before a `.` is the integer part; every remaining
/// segment is concatenated, without a separator, into the fraction.
pub fn split_locale_coordinate(raw: &str) -> (&str, String) {
    let mut segments = raw.split('.');
    let integer = segments.next().unwrap_or_default();
    let fraction: String = segments.collect();
    (integer, fraction)
}

/// Parse a locale-formatted coordinate string into degrees
pub fn parse_locale_coordinate(raw: &str) -> Result<f64, CoordinateParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoordinateParseError::Empty);
    }

    let (integer, fraction) = split_locale_coordinate(trimmed);

    if !INTEGER_PART.is_match(integer) {
        return Err(CoordinateParseError::InvalidCharacters {
            part: "integer",
            text: integer.to_string(),
        });
    }
    if !FRACTION_PART.is_match(&fraction) {
        return Err(CoordinateParseError::InvalidCharacters {
            part: "fractional",
            text: fraction,
        });
    }

    let has_digits = integer.chars().any(|c| c.is_ascii_digit()) || !fraction.is_empty();
    if !has_digits {
        return Err(CoordinateParseError::NoDigits);
    }

    let normalized = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    };

    Ok(normalized.parse::<f64>()?)
}

/// Parse a coordinate as it arrives in a JSON record.
///
/// Only strings go through the locale heuristic. A missing or `null` field
/// and any other JSON type are rejected so the caller's malformed
/// coordinate policy decides the record's fate.
pub fn parse_coordinate_value(value: Option<&Value>) -> Result<f64, CoordinateParseError> {
    match value {
        None | Some(Value::Null) => Err(CoordinateParseError::Missing),
        Some(Value::String(text)) => parse_locale_coordinate(text),
        Some(Value::Number(_)) => Err(CoordinateParseError::NotText { found: "number" }),
        Some(Value::Bool(_)) => Err(CoordinateParseError::NotText { found: "boolean" }),
        Some(Value::Array(_)) => Err(CoordinateParseError::NotText { found: "array" }),
        Some(Value::Object(_)) => Err(CoordinateParseError::NotText { found: "object" }),
    }
}
