//! Field validation shared by registration, promotion, profile updates and uploads.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::verification::errors::{Result, WorkflowError};

static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("phone pattern compiles"));
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles"));

pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_DOCUMENT_NUMBER_LENGTH: usize = 100;

/// Trim and lower-case an e-mail address, rejecting anything that does not look like one.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL.is_match(&email) {
        return Err(WorkflowError::validation("email", "Enter a valid email address"));
    }
    Ok(email)
}

pub fn phone_number(phone: &str) -> Result<()> {
    if !PHONE_NUMBER.is_match(phone) {
        return Err(WorkflowError::validation("phone_number", "Phone: '+999999999'. Up to 15 digits."));
    }
    Ok(())
}

pub fn name(field: &'static str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::validation(field, format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(WorkflowError::validation(
            field,
            format!("{field} must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn passwords(password: &str, confirmation: &str, min_length: usize, max_length: usize) -> Result<()> {
    if password != confirmation {
        return Err(WorkflowError::validation("password", "Password fields didn't match."));
    }
    let length = password.chars().count();
    if length < min_length {
        return Err(WorkflowError::validation(
            "password",
            format!("Password must be at least {min_length} characters"),
        ));
    }
    if length > max_length {
        return Err(WorkflowError::validation(
            "password",
            format!("Password must be at most {max_length} characters"),
        ));
    }
    Ok(())
}

/// Decimal places stored for coordinates, `NUMERIC(9, 6)`
const COORDINATE_SCALE: u32 = 6;
/// Decimal places stored for radii and rates, `NUMERIC(_, 2)`
const AMOUNT_SCALE: u32 = 2;

pub fn latitude(field: &'static str, value: Option<Decimal>) -> Result<()> {
    in_range(field, value, Decimal::from(-90), Decimal::from(90))?;
    max_scale(field, value, COORDINATE_SCALE)
}

pub fn longitude(field: &'static str, value: Option<Decimal>) -> Result<()> {
    in_range(field, value, Decimal::from(-180), Decimal::from(180))?;
    max_scale(field, value, COORDINATE_SCALE)
}

/// Preferred search radius: 0.2 km to 20 km inclusive.
pub fn preferred_radius(value: Option<Decimal>) -> Result<()> {
    in_range("preferred_radius_km", value, Decimal::new(2, 1), Decimal::from(20))?;
    max_scale("preferred_radius_km", value, AMOUNT_SCALE)
}

/// Service radius: positive and below 1000 km, at most two decimal places.
pub fn service_radius(value: Option<Decimal>) -> Result<()> {
    match value {
        Some(v) if v <= Decimal::ZERO || v >= Decimal::from(1000) => Err(WorkflowError::validation(
            "service_radius_km",
            "service_radius_km must be greater than 0 and less than 1000",
        )),
        _ => max_scale("service_radius_km", value, AMOUNT_SCALE),
    }
}

/// Hourly rate: non-negative, below 10000, at most two decimal places.
pub fn hourly_rate(value: Option<Decimal>) -> Result<()> {
    match value {
        Some(v) if v < Decimal::ZERO || v >= Decimal::from(10_000) => Err(WorkflowError::validation(
            "hourly_rate",
            "hourly_rate must be between 0 and 9999.99",
        )),
        _ => max_scale("hourly_rate", value, AMOUNT_SCALE),
    }
}

pub fn bio(value: Option<&str>) -> Result<()> {
    match value {
        Some(bio) if bio.chars().count() > MAX_BIO_LENGTH => Err(WorkflowError::validation(
            "bio",
            format!("bio must be at most {MAX_BIO_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

pub fn document_number(value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::validation("document_number", "document_number is required"));
    }
    if value.chars().count() > MAX_DOCUMENT_NUMBER_LENGTH {
        return Err(WorkflowError::validation(
            "document_number",
            format!("document_number must be at most {MAX_DOCUMENT_NUMBER_LENGTH} characters"),
        ));
    }
    Ok(())
}

/// Uploaded file: non-empty, within the size limit, and of an accepted content type.
pub fn upload(size: usize, content_type: &str, max_size: u64, allowed_content_types: &[String]) -> Result<()> {
    if size == 0 {
        return Err(WorkflowError::validation("file", "The submitted file is empty"));
    }
    if size as u64 > max_size {
        return Err(WorkflowError::validation(
            "file",
            format!("File exceeds the maximum size of {max_size} bytes"),
        ));
    }
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    if !allowed_content_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(&essence)) {
        return Err(WorkflowError::validation(
            "file",
            format!("Content type '{content_type}' is not accepted"),
        ));
    }
    Ok(())
}

/// Postgres would round extra places away, pushing values like 999.999 past the column's precision
fn max_scale(field: &'static str, value: Option<Decimal>, places: u32) -> Result<()> {
    match value {
        Some(v) if v.normalize().scale() > places => Err(WorkflowError::validation(
            field,
            format!("{field} must have at most {places} decimal places"),
        )),
        _ => Ok(()),
    }
}

fn in_range(field: &'static str, value: Option<Decimal>, min: Decimal, max: Decimal) -> Result<()> {
    match value {
        Some(v) if v < min || v > max => Err(WorkflowError::validation(
            field,
            format!("{field} must be between {min} and {max}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM ").unwrap(), "jane.doe@example.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("missing@tld").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn test_phone_number() {
        assert!(phone_number("+9779812345678").is_ok());
        assert!(phone_number("123456789").is_ok());
        assert!(phone_number("12345").is_err());
        assert!(phone_number("+12-345-678-901").is_err());
        assert!(phone_number("1234567890123456789").is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(passwords("correct horse", "correct horse", 8, 64).is_ok());
        assert!(matches!(
            passwords("correct horse", "correct h0rse", 8, 64),
            Err(WorkflowError::Validation { field: Some("password"), .. })
        ));
        assert!(passwords("short", "short", 8, 64).is_err());
        assert!(passwords(&"x".repeat(65), &"x".repeat(65), 8, 64).is_err());
    }

    #[test]
    fn test_preferred_radius_bounds() {
        assert!(preferred_radius(Some(Decimal::new(2, 1))).is_ok());
        assert!(preferred_radius(Some(Decimal::from(20))).is_ok());
        assert!(preferred_radius(Some(Decimal::new(1, 1))).is_err());
        assert!(preferred_radius(Some(Decimal::new(2001, 2))).is_err());
        assert!(preferred_radius(None).is_ok());
    }

    #[test]
    fn test_coordinates() {
        assert!(latitude("current_latitude", Some(Decimal::new(27717245, 6))).is_ok());
        assert!(latitude("current_latitude", Some(Decimal::from(91))).is_err());
        assert!(longitude("current_longitude", Some(Decimal::from(-181))).is_err());
    }

    #[test]
    fn test_worker_fields() {
        assert!(hourly_rate(Some(Decimal::new(2550, 2))).is_ok());
        assert!(hourly_rate(Some(Decimal::new(-1, 0))).is_err());
        assert!(hourly_rate(Some(Decimal::from(10_000))).is_err());
        assert!(hourly_rate(Some(Decimal::new(12345, 3))).is_err());
        assert!(service_radius(Some(Decimal::ZERO)).is_err());
        assert!(service_radius(Some(Decimal::from(10))).is_ok());
        assert!(service_radius(Some(Decimal::new(99999, 2))).is_ok());
        assert!(service_radius(Some(Decimal::new(1250, 3))).is_ok());
        assert!(bio(Some(&"a".repeat(500))).is_ok());
        assert!(bio(Some(&"a".repeat(501))).is_err());
    }

    #[test]
    fn test_values_beyond_column_scale_are_rejected() {
        // 999.999 would round up to 1000.00 and overflow NUMERIC(5, 2)
        assert!(matches!(
            service_radius(Some(Decimal::new(999999, 3))),
            Err(WorkflowError::Validation { field: Some("service_radius_km"), .. })
        ));
        assert!(service_radius(Some(Decimal::new(123456789, 7))).is_err());
        assert!(preferred_radius(Some(Decimal::new(19999, 3))).is_err());
        assert!(latitude("service_latitude", Some(Decimal::new(277172451, 7))).is_err());
        assert!(longitude("service_longitude", Some(Decimal::new(85324000, 6))).is_ok());
    }

    #[test]
    fn test_document_number() {
        assert!(document_number("NIN-123").is_ok());
        assert!(document_number("   ").is_err());
        assert!(document_number(&"9".repeat(101)).is_err());
    }

    #[test]
    fn test_upload() {
        let allowed = vec!["application/pdf".to_string(), "image/png".to_string()];
        assert!(upload(10, "application/pdf", 100, &allowed).is_ok());
        assert!(upload(10, "image/PNG; charset=binary", 100, &allowed).is_ok());
        assert!(upload(0, "application/pdf", 100, &allowed).is_err());
        assert!(upload(101, "application/pdf", 100, &allowed).is_err());
        assert!(upload(10, "text/html", 100, &allowed).is_err());
    }
}
