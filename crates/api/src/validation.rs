//! Request validation
//!
//! Range and shape checks applied before requests reach storage or the
//! scorer. Failures map to 422 responses.

use route_safety::Coordinate;
use thiserror::Error;

/// Errors during request validation
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Coordinate array too short
    #[error("{field} needs [lat, lng], got {actual} component(s)")]
    TooFewComponents { field: &'static str, actual: usize },

    /// Collection over its size limit
    #[error("{field} allows at most {max} entries, got {actual}")]
    TooMany {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Invalid data format
    #[error("Invalid {field}: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
}

pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "hi"];

/// Severity must be 1-5
pub fn severity(value: i64) -> Result<u8, ValidationError> {
    if !(1..=5).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "severity",
            value,
            min: 1,
            max: 5,
        });
    }
    Ok(value as u8)
}

/// `[lat, lng, ...]`; components past the second are ignored
pub fn coordinate(field: &'static str, values: &[f64]) -> Result<Coordinate, ValidationError> {
    match values {
        [lat, lng, ..] => Ok(Coordinate::new(*lat, *lng)),
        _ => Err(ValidationError::TooFewComponents {
            field,
            actual: values.len(),
        }),
    }
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email",
            reason: format!("'{}' is not an email address", value),
        }),
    }
}

pub fn language(value: &str) -> Result<(), ValidationError> {
    if SUPPORTED_LANGUAGES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "language",
            reason: format!("expected one of {:?}", SUPPORTED_LANGUAGES),
        })
    }
}

pub fn emergency_contacts(contacts: &[String], max: usize) -> Result<(), ValidationError> {
    if contacts.len() > max {
        return Err(ValidationError::TooMany {
            field: "emergency_contacts",
            max,
            actual: contacts.len(),
        });
    }
    Ok(())
}
