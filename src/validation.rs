use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const MIN_NAME_LEN: usize = 1;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_FOLDER_NAME_LEN: usize = 128;
pub const MIN_NOTE_TITLE_LEN: usize = 1;
pub const MAX_NOTE_TITLE_LEN: usize = 255;
pub const MAX_NOTE_BODY_LEN: usize = 100_000;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_EMAIL_LEN: usize = 255;

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 100;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{0} is not a valid email address")]
    Email(String),
}

/// Checks the character count of `value` against an inclusive range.
pub fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    validate_length("email", email, 3, MAX_EMAIL_LEN)?;
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::Email(email.to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    validate_length("password", password, MIN_PASSWORD_LEN, MAX_PASSWORD_LEN)
}

pub fn validate_note(title: &str, body: &str) -> Result<(), ValidationError> {
    validate_length("title", title, MIN_NOTE_TITLE_LEN, MAX_NOTE_TITLE_LEN)?;
    validate_length("body", body, 0, MAX_NOTE_BODY_LEN)
}

pub fn validate_folder_name(name: &str) -> Result<(), ValidationError> {
    validate_length("name", name.trim(), MIN_NAME_LEN, MAX_FOLDER_NAME_LEN)
}
