//! Core error types for the depreciation engine.
//!
//! Validation failures are always surfaced to the caller. Calculation failures
//! are the only errors the book-value query layer may replace with a fallback.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the depreciation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Depreciation calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

impl Error {
    /// Returns true when the error was caused by malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Errors that occur while building a depreciation schedule from valid input.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    #[error("Calendar month {year}-{month:02} is outside the supported date range")]
    DateOutOfRange { year: i32, month: u32 },
}

/// Validation errors for asset input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unsupported depreciation method: {0}")]
    UnsupportedMethod(String),

    #[error("Failed to parse date '{input}': {source}")]
    DateTimeParse {
        input: String,
        #[source]
        source: ChronoParseError,
    },
}

impl ValidationError {
    /// Creates an InvalidInput error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err: Error = ValidationError::invalid("salvage value exceeds unit price").into();
        assert_eq!(
            err.to_string(),
            "Input validation failed: Invalid input: salvage value exceeds unit price"
        );

        let err: Error = CalculatorError::DateOutOfRange {
            year: 262143,
            month: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Depreciation calculation failed: Calendar month 262143-03 is outside the supported date range"
        );

        let err = ValidationError::UnsupportedMethod("SUM_OF_YEARS".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported depreciation method: SUM_OF_YEARS"
        );
    }

    #[test]
    fn test_is_validation() {
        let err: Error = ValidationError::MissingField("unitPrice".to_string()).into();
        assert!(err.is_validation());

        let err: Error = CalculatorError::Overflow("accumulated depreciation").into();
        assert!(!err.is_validation());

        assert!(!Error::InvalidConfigValue("cacheTtlSecs".to_string()).is_validation());
    }

    #[test]
    fn test_serde_error_is_validation() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(err.is_validation());
    }
}
