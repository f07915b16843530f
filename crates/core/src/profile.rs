//! Student profile field parsing and validation.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::CoreError;

/// Wire format of every date-only field (`date_of_birth`, fee due dates, ...).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Highest number of semesters a student can request.
pub const MAX_SEMESTERS: i32 = 12;

/// Optional leading `+`, then 7 to 15 digits with optional spaces or dashes.
static CONTACT_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("contact number regex is valid")
});

/// Parse a `YYYY-MM-DD` date, naming the field in the error.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        CoreError::Validation(format!("Invalid {field} format. Use YYYY-MM-DD"))
    })
}

/// Parse a date of birth and reject dates in the future.
pub fn parse_date_of_birth(value: &str, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let dob = parse_date(value, "date_of_birth")?;
    if dob >= today {
        return Err(CoreError::Validation(
            "Date of birth must be in the past".into(),
        ));
    }
    Ok(dob)
}

/// Validate and normalize a contact number.
pub fn normalize_contact_number(value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !CONTACT_NUMBER_RE.is_match(trimmed) || !(7..=15).contains(&digits) {
        return Err(CoreError::Validation(format!(
            "Invalid contact number '{trimmed}'"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate the number of semesters requested.
pub fn validate_semesters(semesters: i32) -> Result<(), CoreError> {
    if !(1..=MAX_SEMESTERS).contains(&semesters) {
        return Err(CoreError::Validation(format!(
            "Semesters requested must be between 1 and {MAX_SEMESTERS}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        let d = parse_date("2003-11-04", "date_of_birth").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2003, 11, 4).unwrap());
    }

    #[test]
    fn rejects_other_date_formats() {
        let err = parse_date("04/11/2003", "date_of_birth").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn future_birth_date_is_rejected() {
        assert!(parse_date_of_birth("2030-01-01", today()).is_err());
        assert!(parse_date_of_birth("2001-01-01", today()).is_ok());
    }

    #[test]
    fn contact_numbers() {
        assert_eq!(normalize_contact_number(" 9876543210 ").unwrap(), "9876543210");
        assert!(normalize_contact_number("+91 98765-43210").is_ok());
        assert!(normalize_contact_number("12345").is_err());
        assert!(normalize_contact_number("call me").is_err());
    }

    #[test]
    fn semesters_in_range() {
        assert!(validate_semesters(1).is_ok());
        assert!(validate_semesters(8).is_ok());
        assert!(validate_semesters(0).is_err());
        assert!(validate_semesters(13).is_err());
    }
}
