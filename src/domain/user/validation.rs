//! Field validation for user records

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during user field validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Name must be at least {0} characters")]
    NameTooShort(usize),

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),
}

const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 80;
const MAX_PASSWORD_LENGTH: usize = 128;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

// Optional leading +, first digit non-zero, 2-14 digits total
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,13}$").unwrap());

/// Lowercase and trim an email address before validation and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a display name
///
/// Rules:
/// - Minimum 2 characters
/// - Maximum 80 characters
pub fn validate_name(name: &str) -> Result<(), UserValidationError> {
    let length = name.chars().count();

    if length < MIN_NAME_LENGTH {
        return Err(UserValidationError::NameTooShort(MIN_NAME_LENGTH));
    }

    if length > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate an email address (local@domain syntax)
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a phone number
///
/// Accepts an optional leading `+` followed by 2-14 digits with no leading
/// zero, e.g. `+15550001` or `447911123456`.
pub fn validate_phone(phone: &str) -> Result<(), UserValidationError> {
    if !PHONE_RE.is_match(phone) {
        return Err(UserValidationError::InvalidPhone);
    }

    Ok(())
}

/// Validate a plaintext password before hashing
///
/// Rules:
/// - Cannot be empty
/// - Maximum 128 characters, so hashing cost stays bounded
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
