//! Input normalization shared by the entity mutations.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} may only contain letters and digits, got {value:?}")]
    InvalidCode { field: &'static str, value: String },
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("level must be one of 100, 200, ..., 900, got {0}")]
    InvalidLevel(i32),
    #[error("units must be between 1 and 6, got {0}")]
    InvalidUnits(i32),
    #[error("session must look like 2025/2026, got {0:?}")]
    InvalidSession(String),
    #[error("entry year {0} is out of range")]
    InvalidYear(i32),
}

/// Trimmed, non-empty text.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(value.to_string())
}

/// Upper-cased alphanumeric code such as `CSC301` or `SCI`.
pub fn code(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?.to_uppercase();
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidCode { field, value });
    }
    Ok(value)
}

/// Lower-cased email with one `@`, a non-empty local part and a dotted domain.
pub fn email(value: &str) -> Result<String, ValidationError> {
    let value = value.trim().to_lowercase();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(value)
    } else {
        Err(ValidationError::InvalidEmail(value))
    }
}

pub fn level(value: i32) -> Result<i32, ValidationError> {
    if (100..=900).contains(&value) && value % 100 == 0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidLevel(value))
    }
}

pub fn units(value: i32) -> Result<i32, ValidationError> {
    if (1..=6).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidUnits(value))
    }
}

/// Academic session `YYYY/YYYY` where the second year follows the first.
pub fn session(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    let invalid = || ValidationError::InvalidSession(value.to_string());

    let (start, end) = value.split_once('/').ok_or_else(invalid)?;
    let is_year = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit());
    if !is_year(start) || !is_year(end) {
        return Err(invalid());
    }

    let start: i32 = start.parse().map_err(|_| invalid())?;
    let end: i32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(invalid());
    }

    Ok(value.to_string())
}

pub fn entry_year(value: i32) -> Result<i32, ValidationError> {
    if (1950..=2100).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidYear(value))
    }
}

/// `Some` of a trimmed non-empty value, `None` when blank.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
