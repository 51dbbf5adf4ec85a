//! Pure validation for request payloads.

use thiserror::Error;

pub const MAX_SLUG_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Slug must be lowercase letters, digits and single hyphens: '{0}'")]
    InvalidSlug(String),
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error("Component order must list every component of the page exactly once")]
    ComponentOrderMismatch,
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

/// Accepts `home`, `about-us`, `satsang-2024`; rejects empty, uppercase,
/// leading/trailing/double hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::EmptyField("slug"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "slug",
            max: MAX_SLUG_LEN,
        });
    }
    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");
    if !well_formed {
        return Err(ValidationError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

pub fn validate_required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Lowercases and trims an email, rejecting anything without a local part
/// and a dotted domain.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email",
            max: MAX_EMAIL_LEN,
        });
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}
