//! Input validation for API requests.
//!
//! These are form-level checks only ("required field present", basic
//! shapes). Referential integrity and uniqueness belong to the backend
//! schema.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose email shape: something@something.something, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Regex for validating HTTP/HTTPS media URLs
    static ref HTTP_URL_REGEX: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

/// Minimum password length accepted by the auth platform's default policy
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a sign-up password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }

    if password.len() > 72 {
        return Err("Password is too long (max 72 characters)".to_string());
    }

    Ok(())
}

/// Validate a required free-text field such as a task or campaign title
pub fn validate_required(value: &str, field_label: &str, max_len: usize) -> Result<(), String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(format!("{} is required", field_label));
    }

    if value.chars().count() > max_len {
        return Err(format!(
            "{} is too long (max {} characters)",
            field_label, max_len
        ));
    }

    Ok(())
}

/// Validate that a select input carries a value
pub fn validate_selected(id: &Option<String>, field_label: &str) -> Result<String, String> {
    match id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(format!("Please select {}", field_label)),
    }
}

/// Validate a monetary amount (reward or budget)
pub fn validate_amount(amount: f64, field_label: &str) -> Result<(), String> {
    if !amount.is_finite() {
        return Err(format!("{} must be a number", field_label));
    }

    if amount < 0.0 {
        return Err(format!("{} cannot be negative", field_label));
    }

    Ok(())
}

/// Validate a month number
pub fn validate_month(month: u32) -> Result<(), String> {
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12".to_string());
    }

    Ok(())
}

/// Validate a year
pub fn validate_year(year: i32) -> Result<(), String> {
    if !(2000..=2100).contains(&year) {
        return Err("Year must be between 2000 and 2100".to_string());
    }

    Ok(())
}

/// Validate a public media URL
pub fn validate_media_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("Video URL is required".to_string());
    }

    if url.len() > 2048 {
        return Err("Video URL is too long (max 2048 characters)".to_string());
    }

    if !HTTP_URL_REGEX.is_match(url) {
        return Err("Video URL must be an http(s) URL".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("creator@example.com").is_ok());
        assert!(validate_email("  creator@example.co.uk ").is_ok());
        assert!(validate_email("first.last+tag@sub.example.io").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spa ce@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("abc123").is_ok());
        assert!(validate_password("abc12").is_err());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Unboxing", "Title", 200).is_ok());
        assert_eq!(
            validate_required("   ", "Title", 200).unwrap_err(),
            "Title is required"
        );
        assert!(validate_required(&"a".repeat(201), "Title", 200).is_err());
    }

    #[test]
    fn test_validate_selected() {
        assert_eq!(validate_selected(&Some(" 12 ".to_string()), "a task").unwrap(), "12");
        assert_eq!(
            validate_selected(&Some(String::new()), "a task").unwrap_err(),
            "Please select a task"
        );
        assert!(validate_selected(&None, "an influencer").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.0, "Reward").is_ok());
        assert!(validate_amount(99.99, "Reward").is_ok());
        assert!(validate_amount(-1.0, "Reward").is_err());
        assert!(validate_amount(f64::NAN, "Budget").is_err());
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());

        assert!(validate_year(2026).is_ok());
        assert!(validate_year(1999).is_err());
    }

    #[test]
    fn test_validate_media_url() {
        assert!(validate_media_url("https://res.cloudinary.com/demo/video/upload/v1/clip.mp4").is_ok());
        assert!(validate_media_url("http://cdn.example.com/a.mp4").is_ok());

        assert!(validate_media_url("").is_err());
        assert!(validate_media_url("ftp://example.com/a.mp4").is_err());
        assert!(validate_media_url("https://exa mple.com").is_err());
    }
}
