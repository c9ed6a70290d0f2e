//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Not found errors
    IntegrationNotFound,
    FundingSourceNotFound,
    BudgetNotFound,

    // Provider errors
    ConnectionFailed,
    UnsupportedProvider,
    UnsupportedOperation,
    SyncFailed,

    // Authorization errors
    Unauthorized,
    InvalidOAuthState,

    // Infrastructure errors
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::IntegrationNotFound => "INTEGRATION_NOT_FOUND",
            ErrorCode::FundingSourceNotFound => "FUNDING_SOURCE_NOT_FOUND",
            ErrorCode::BudgetNotFound => "BUDGET_NOT_FOUND",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::UnsupportedProvider => "UNSUPPORTED_PROVIDER",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::SyncFailed => "SYNC_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidOAuthState => "INVALID_OAUTH_STATE",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates an integration-not-found error.
    pub fn integration_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::IntegrationNotFound,
            format!("Integration '{}' not found", id),
        )
    }

    /// Creates a funding-source-not-found error.
    pub fn funding_source_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::FundingSourceNotFound,
            format!("Funding source '{}' not found", id),
        )
    }

    /// Creates a budget-not-found error.
    pub fn budget_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::BudgetNotFound,
            format!("Budget '{}' not found", id),
        )
    }

    /// Creates an unsupported-provider error.
    pub fn unsupported_provider(provider: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedProvider,
            format!("Unsupported provider: {}", provider),
        )
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedOperation, message)
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectionFailed, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("category");
        assert_eq!(format!("{}", err), "Field 'category' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("percentage", 0.0, 1000.0, 1500.0);
        assert_eq!(
            format!("{}", err),
            "Field 'percentage' must be between 0 and 1000, got 1500"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::integration_not_found("xyz");
        assert_eq!(
            format!("{}", err),
            "[INTEGRATION_NOT_FOUND] Integration 'xyz' not found"
        );
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::SyncFailed, "Sync failed")
            .with_detail("provider", "plaid")
            .with_detail("step", "expenses");

        assert_eq!(err.details.get("provider"), Some(&"plaid".to_string()));
        assert_eq!(err.details.get("step"), Some(&"expenses".to_string()));
    }

    #[test]
    fn validation_error_converts_to_domain_error() {
        let err: DomainError = ValidationError::empty_field("user_id").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
