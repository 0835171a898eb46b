//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Minimum number of digit characters for a phone number to be accepted.
const MIN_PHONE_DIGITS: usize = 10;

/// Validates a phone number: digits, spaces, dashes, plus and parentheses
/// only, with at least [`MIN_PHONE_DIGITS`] digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    if allowed && digits >= MIN_PHONE_DIGITS {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must contain at least 10 digits".into());
        Err(err)
    }
}

/// Validates that a time window is well-formed (`start < end`).
pub fn validate_time_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_window");
        err.message = Some("end_time must be after start_time".into());
        Err(err)
    }
}

/// Validates that a date range is well-formed (`start < end`).
pub fn validate_date_range(
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_range");
        err.message = Some("end_date must be after start_date".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_valid_phone_formats() {
        assert!(validate_phone("0123456789").is_ok());
        assert!(validate_phone("+32 2 332 11 66").is_ok());
        assert!(validate_phone("(02) 332-1166").is_ok());
    }

    #[test]
    fn test_phone_rejects_letters() {
        assert!(validate_phone("01234abcde").is_err());
    }

    #[test]
    fn test_phone_rejects_too_short() {
        assert!(validate_phone("12345").is_err());
    }

    #[test]
    fn test_time_window() {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 4, 1, 11, 0, 0).unwrap();
        assert!(validate_time_window(start, end).is_ok());
        assert!(validate_time_window(end, start).is_err());
        assert!(validate_time_window(start, start).is_err());
    }

    #[test]
    fn test_date_range() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(end, start).is_err());
    }
}
