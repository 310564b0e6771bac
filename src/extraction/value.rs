//! Strict scalar parsing and formatting.
//!
//! Converts the raw strings typed into review inputs into field values, and
//! back. Empty numeric input means "no value"; anything else must parse to a
//! finite number or it is rejected.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TimecardError};
use crate::storage::models::Field;

lazy_static! {
    /// `H:MM`, `HH:MM`, or `HH:MM:SS` (seconds are accepted but ignored).
    static ref TIME_OF_DAY: Regex =
        Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)(?::[0-5]\d)?$").unwrap();

    /// Two-letter state abbreviation.
    static ref STATE_CODE: Regex = Regex::new(r"^[A-Za-z]{2}$").unwrap();
}

/// Parse a numeric input.
///
/// # Examples
/// ```
/// use timecard_core::extraction::parse_number;
/// use timecard_core::storage::Field;
/// assert_eq!(parse_number(Field::Quantity, "").unwrap(), None);
/// assert_eq!(parse_number(Field::Quantity, " 12.5 ").unwrap(), Some(12.5));
/// assert!(parse_number(Field::Quantity, "12a").is_err());
/// ```
pub fn parse_number(field: Field, raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(TimecardError::InvalidNumber {
            field,
            input: raw.to_string(),
        }),
    }
}

/// Parse a free-text input. Blank input means "no value".
pub fn parse_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a state abbreviation, normalised to upper case.
pub fn parse_state_code(field: Field, raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !STATE_CODE.is_match(trimmed) {
        return Err(TimecardError::InvalidText {
            field,
            input: raw.to_string(),
            reason: "expected a two-letter state code".to_string(),
        });
    }
    Ok(Some(trimmed.to_ascii_uppercase()))
}

/// Parse a time-of-day input into `(hour, minute)`.
pub fn parse_time_of_day(field: Field, raw: &str) -> Result<(u32, u32)> {
    let invalid = || TimecardError::InvalidTime {
        field,
        input: raw.to_string(),
    };

    let caps = TIME_OF_DAY.captures(raw.trim()).ok_or_else(invalid)?;
    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;
    Ok((hour, minute))
}

/// Overwrite the hour and minute of a timestamp in the local offset.
///
/// The local date of `original` is preserved, as are its seconds. Without an
/// original timestamp, the time lands on `fallback_date` at zero seconds.
pub fn apply_time_of_day(
    original: Option<DateTime<Utc>>,
    fallback_date: NaiveDate,
    (hour, minute): (u32, u32),
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let (date, second, nano) = match original {
        Some(ts) => {
            let local = ts.with_timezone(&offset);
            (local.date_naive(), local.second(), local.nanosecond())
        }
        None => (fallback_date, 0, 0),
    };

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nano)?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Render a number the way an input shows it: integers without a fraction.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => v.to_string(),
    }
}

/// Render a timestamp as local `HH:MM`.
pub fn format_time_of_day(value: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    value
        .map(|ts| ts.with_timezone(&offset).format("%H:%M").to_string())
        .unwrap_or_default()
}

pub fn format_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}
