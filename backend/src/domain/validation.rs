//! Field-level validation shared by the domain entities.
//!
//! Each helper normalises its input and returns a [`FieldError`] naming the
//! offending field, which converts into an `invalid_request` [`Error`] whose
//! details carry `{field, code}`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::Error;

/// A single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    field: &'static str,
    code: &'static str,
    message: String,
}

impl FieldError {
    /// Build a new field error.
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }

    /// Name of the offending field as exposed over the API.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Stable machine-readable failure code.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<FieldError> for Error {
    fn from(value: FieldError) -> Self {
        Error::invalid_request(value.to_string()).with_details(json!({
            "field": value.field,
            "code": value.code,
        }))
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|error| panic!("regex {pattern} failed to compile: {error}"))
    })
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static VIN_RE: OnceLock<Regex> = OnceLock::new();
static PLATE_RE: OnceLock<Regex> = OnceLock::new();
static SKU_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_RE: OnceLock<Regex> = OnceLock::new();
static CURRENCY_RE: OnceLock<Regex> = OnceLock::new();

/// Trim `value` and require its character count to fall in `min..=max`.
pub fn text(field: &'static str, value: &str, min: usize, max: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length == 0 && min > 0 {
        return Err(FieldError::new(field, "required", "must not be empty"));
    }
    if length < min {
        return Err(FieldError::new(
            field,
            "too_short",
            format!("must be at least {min} characters"),
        ));
    }
    if length > max {
        return Err(FieldError::new(
            field,
            "too_long",
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Optional free text; blank input collapses to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, FieldError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => text(field, v, 1, max).map(Some),
        None => Ok(None),
    }
}

/// Lower-cased e-mail address.
pub fn email(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised = value.trim().to_lowercase();
    let re = compiled(&EMAIL_RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$");
    if normalised.len() > 254 || !re.is_match(&normalised) {
        return Err(FieldError::new(field, "invalid_email", "must be a valid email address"));
    }
    Ok(normalised)
}

/// Optional e-mail address; blank input collapses to `None`.
pub fn optional_email(field: &'static str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => email(field, v).map(Some),
        None => Ok(None),
    }
}

/// Phone number of 7 to 20 characters drawn from digits, spaces and `+-()`.
pub fn phone(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let re = compiled(&PHONE_RE, r"^[0-9 +\-()]{7,20}$");
    if !re.is_match(trimmed) {
        return Err(FieldError::new(
            field,
            "invalid_phone",
            "must be 7 to 20 digits, spaces or +-() characters",
        ));
    }
    Ok(trimmed.to_owned())
}

/// Upper-cased 17 character VIN excluding I, O and Q.
pub fn vin(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised = value.trim().to_uppercase();
    let re = compiled(&VIN_RE, "^[A-HJ-NPR-Z0-9]{17}$");
    if !re.is_match(&normalised) {
        return Err(FieldError::new(
            field,
            "invalid_vin",
            "must be 17 characters excluding I, O and Q",
        ));
    }
    Ok(normalised)
}

/// Upper-cased licence plate with whitespace removed.
pub fn license_plate(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let re = compiled(&PLATE_RE, "^[A-Z0-9-]{2,15}$");
    if !re.is_match(&normalised) {
        return Err(FieldError::new(
            field,
            "invalid_license_plate",
            "must be 2 to 15 letters, digits or hyphens",
        ));
    }
    Ok(normalised)
}

/// Upper-cased stock keeping unit.
pub fn sku(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised = value.trim().to_uppercase();
    let re = compiled(&SKU_RE, r"^[A-Z0-9\-_.]{1,40}$");
    if !re.is_match(&normalised) {
        return Err(FieldError::new(
            field,
            "invalid_sku",
            "must be 1 to 40 letters, digits or -_. characters",
        ));
    }
    Ok(normalised)
}

/// Tenant slug: lower-case letters, digits and inner hyphens.
pub fn slug(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised = value.trim().to_lowercase();
    let re = compiled(&SLUG_RE, "^[a-z0-9][a-z0-9-]{1,48}[a-z0-9]$");
    if !re.is_match(&normalised) {
        return Err(FieldError::new(
            field,
            "invalid_slug",
            "must be 3 to 50 lower-case letters, digits or inner hyphens",
        ));
    }
    Ok(normalised)
}

/// ISO 4217 currency code.
pub fn currency(field: &'static str, value: &str) -> Result<String, FieldError> {
    let normalised = value.trim().to_uppercase();
    let re = compiled(&CURRENCY_RE, "^[A-Z]{3}$");
    if !re.is_match(&normalised) {
        return Err(FieldError::new(field, "invalid_currency", "must be a 3 letter ISO 4217 code"));
    }
    Ok(normalised)
}

/// Plain-text password length check. The value is not trimmed.
pub fn password(field: &'static str, value: &str) -> Result<(), FieldError> {
    let length = value.chars().count();
    if !(8..=128).contains(&length) {
        return Err(FieldError::new(
            field,
            "invalid_password",
            "must be between 8 and 128 characters",
        ));
    }
    Ok(())
}

/// Tax rate expressed in basis points.
pub fn basis_points(field: &'static str, value: u32) -> Result<u32, FieldError> {
    if value > 10_000 {
        return Err(FieldError::new(field, "out_of_range", "must be between 0 and 10000"));
    }
    Ok(value)
}

/// Non-negative money amount in cents.
pub fn non_negative_cents(field: &'static str, value: i64) -> Result<i64, FieldError> {
    if value < 0 {
        return Err(FieldError::new(field, "out_of_range", "must not be negative"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("  Jane ", Ok("Jane".to_owned()))]
    #[case("", Err("required"))]
    #[case("   ", Err("required"))]
    fn text_trims_and_requires(#[case] input: &str, #[case] expected: Result<String, &str>) {
        let result = text("firstName", input, 1, 50).map_err(|e| e.code());
        assert_eq!(result, expected);
    }

    #[rstest]
    fn text_enforces_maximum() {
        let err = text("firstName", &"x".repeat(51), 1, 50).expect_err("too long");
        assert_eq!(err.code(), "too_long");
    }

    #[rstest]
    #[case("Ada@Example.COM", true)]
    #[case("ada@example", false)]
    #[case("ada example.com", false)]
    fn email_validation(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(email("email", input).is_ok(), ok);
        if ok {
            assert_eq!(email("email", input).expect("valid"), "ada@example.com");
        }
    }

    #[rstest]
    #[case("+1 (555) 010-2030", true)]
    #[case("12345", false)]
    #[case("555-CALL-NOW", false)]
    fn phone_validation(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(phone("phone", input).is_ok(), ok);
    }

    #[rstest]
    #[case("1hgcm82633a004352", true)]
    #[case("1HGCM82633A00435", false)]
    #[case("1HGCM82633A00435I", false)]
    #[case("1HGCM82633A00435O", false)]
    fn vin_validation(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(vin("vin", input).is_ok(), ok);
    }

    #[rstest]
    fn plate_is_normalised() {
        assert_eq!(license_plate("licensePlate", " ab 12 cd ").expect("valid"), "AB12CD");
        assert!(license_plate("licensePlate", "A").is_err());
    }

    #[rstest]
    #[case("joes-garage", true)]
    #[case("-joes", false)]
    #[case("joes-", false)]
    #[case("jo", false)]
    #[case("Joe's", false)]
    fn slug_validation(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(slug("slug", input).is_ok(), ok);
    }

    #[rstest]
    fn field_error_converts_to_invalid_request_with_details() {
        let error: Error = FieldError::new("vin", "invalid_vin", "bad vin").into();
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details");
        assert_eq!(details["field"], "vin");
        assert_eq!(details["code"], "invalid_vin");
    }
}
