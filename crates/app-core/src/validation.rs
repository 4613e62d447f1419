//! Field validation rules for the registration form
//!
//! All rules are pure functions of the raw field values. They never fail;
//! problems are reported as [`FieldError`] values for inline annotations.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum password length accepted by the backend
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Inline annotation for a form field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    /// Field is empty
    #[error("This field is required")]
    Empty,

    /// Backend refused the nickname
    #[error("Nickname rejected: {0}")]
    NicknameRejected(String),

    /// Email does not look like an email address
    #[error("Invalid email address")]
    InvalidEmail,

    /// Backend refused the email
    #[error("Email rejected: {0}")]
    EmailRejected(String),

    /// Password shorter than the minimum length
    #[error("Password must be at least {min_length} characters")]
    PasswordTooShort {
        /// Required length
        min_length: usize,
    },

    /// Password has no digit
    #[error("Password must contain at least one number")]
    PasswordMissingDigit,

    /// Repeated password differs from the password
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Check if a string is a syntactically valid email address
///
/// The whole string must match; surrounding whitespace is not accepted.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_REGEX.get_or_init(|| {
        // local@domain.tld, with length limits per label
        Regex::new(
            r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(?:\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
        )
        .unwrap()
    });
    re.is_match(email)
}

/// Nicknames only need to be non-empty locally; the backend decides the rest
pub fn is_valid_nickname(nickname: &str) -> bool {
    !nickname.is_empty()
}

/// Check password length and digit requirements
pub fn is_password_valid(password: &str, min_length: usize) -> bool {
    password_error(password, min_length).is_none()
}

/// Inline error for a password, if any
///
/// Length is reported before the missing digit.
pub fn password_error(password: &str, min_length: usize) -> Option<FieldError> {
    if password.is_empty() {
        Some(FieldError::Empty)
    } else if password.chars().count() < min_length {
        Some(FieldError::PasswordTooShort { min_length })
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some(FieldError::PasswordMissingDigit)
    } else {
        None
    }
}

/// Lowercase the string and uppercase its first character
pub fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
