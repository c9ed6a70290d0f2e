//! Integration provider port - the shared capability contract.
//!
//! Every provider adapter (PayPal, Venmo, Cash App, Plaid, Expensify)
//! implements this trait. Adapters hold no reference back to the registry;
//! the registry owns them one-directionally.
//!
//! # Design
//!
//! - **Connect-then-use**: adapters start unconfigured; `connect` stores
//!   credentials and probes the provider before the adapter is usable.
//! - **Sync failures are data**: `sync_expenses`/`sync_categories` return a
//!   failed [`SyncResult`] for provider-side errors so callers can continue
//!   with remaining sync steps; `Err` is reserved for adapter-level faults
//!   (never connected, credentials missing) which abort the sync.
//! - **Capability honesty**: providers without expense-report support fail
//!   with an unsupported-operation error rather than silently no-opping.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::integration::{ExpenseReport, IntegrationConfig, ProviderKind, SyncResult};

/// Default sync watermark when the caller supplies none.
pub(crate) const DEFAULT_SYNC_WINDOW_DAYS: i64 = 30;

/// Port for provider integrations.
#[async_trait]
pub trait IntegrationProvider: Send + Sync {
    /// The provider this adapter fronts.
    fn kind(&self) -> ProviderKind;

    /// Stores configuration, extracts credentials, and probes connectivity.
    ///
    /// Fails with a connection error when the probe does not succeed; on
    /// success the adapter transitions from unconfigured to ready.
    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError>;

    /// Releases provider-side session state and clears stored credentials.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Read-only connectivity probe.
    ///
    /// Returns `false` on any failure, never errors. Used at connect time
    /// and for health checks.
    async fn test_connection(&self) -> bool;

    /// Pulls provider-side transactions since the watermark.
    ///
    /// Defaults to 30 days back when `since` is `None`. Provider errors
    /// come back as a failed `SyncResult`; `Err` means the adapter itself
    /// is unusable (not connected).
    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError>;

    /// Pulls provider-side category data.
    async fn sync_categories(&self) -> Result<SyncResult, ProviderError>;

    /// Creates an expense report on the provider.
    ///
    /// Payment-only providers fail with an unsupported-operation error.
    async fn create_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError>;

    /// Updates an existing expense report on the provider.
    async fn update_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError>;

    /// Fetches an expense report by provider-side id.
    async fn get_expense_report(&self, report_id: &str) -> Result<ExpenseReport, ProviderError>;

    /// Lists the provider's expense categories.
    async fn get_categories(&self) -> Result<Vec<String>, ProviderError>;

    /// Field-name mapping from the common report shape to the provider's.
    fn get_mapping_fields(&self) -> HashMap<String, String>;
}

/// Resolves the effective sync watermark.
pub(crate) fn sync_watermark(since: Option<Timestamp>) -> Timestamp {
    since.unwrap_or_else(|| Timestamp::now().minus_days(DEFAULT_SYNC_WINDOW_DAYS))
}

/// Error codes for provider operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// Provider rejected the credentials.
    AuthenticationError,

    /// Connectivity probe failed at connect time.
    ConnectionFailed,

    /// Adapter used before a successful `connect`.
    NotConnected,

    /// Resource not found on the provider.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Capability not offered by this provider.
    UnsupportedOperation,

    /// Provider returned a response we could not interpret.
    InvalidResponse,

    /// Unknown error.
    Unknown,
}

impl ProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::NetworkError | ProviderErrorCode::RateLimitExceeded
        )
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderErrorCode::NetworkError => "NETWORK_ERROR",
            ProviderErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ProviderErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ProviderErrorCode::NotConnected => "NOT_CONNECTED",
            ProviderErrorCode::NotFound => "NOT_FOUND",
            ProviderErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ProviderErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ProviderErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ProviderErrorCode::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Error from a provider operation.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct ProviderError {
    /// Error code for categorization.
    pub code: ProviderErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's own error code, when it supplied one.
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationError, message)
    }

    /// Create a connect-time probe failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConnectionFailed, message)
    }

    /// Create a not-connected error for a provider.
    pub fn not_connected(provider: ProviderKind) -> Self {
        Self::new(
            ProviderErrorCode::NotConnected,
            format!("{} adapter is not connected", provider.display_name()),
        )
    }

    /// Create an unsupported-operation error for a provider.
    pub fn unsupported(operation: &str, provider: ProviderKind) -> Self {
        Self::new(
            ProviderErrorCode::UnsupportedOperation,
            format!(
                "{} does not support {}",
                provider.display_name(),
                operation
            ),
        )
    }

    /// Create an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Create a not-found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            ProviderErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ProviderError::network(err.to_string())
        } else if err.is_decode() {
            ProviderError::invalid_response(err.to_string())
        } else {
            ProviderError::new(ProviderErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        let code = match err.code {
            ProviderErrorCode::UnsupportedOperation => ErrorCode::UnsupportedOperation,
            ProviderErrorCode::NotFound => ErrorCode::IntegrationNotFound,
            ProviderErrorCode::NetworkError
            | ProviderErrorCode::AuthenticationError
            | ProviderErrorCode::ConnectionFailed
            | ProviderErrorCode::NotConnected => ErrorCode::ConnectionFailed,
            ProviderErrorCode::RateLimitExceeded
            | ProviderErrorCode::InvalidResponse
            | ProviderErrorCode::Unknown => ErrorCode::InternalError,
        };
        let mut domain = DomainError::new(code, err.message);
        if let Some(provider_code) = err.provider_code {
            domain = domain.with_detail("provider_code", provider_code);
        }
        domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_flag_follows_code() {
        assert!(ProviderError::network("timeout").retryable);
        assert!(!ProviderError::authentication("bad key").retryable);
    }

    #[test]
    fn unsupported_names_provider_and_operation() {
        let err = ProviderError::unsupported("expense reports", ProviderKind::PayPal);
        assert_eq!(err.code, ProviderErrorCode::UnsupportedOperation);
        assert!(err.message.contains("PayPal"));
        assert!(err.message.contains("expense reports"));
    }

    #[test]
    fn conversion_to_domain_error_maps_codes() {
        let err: DomainError =
            ProviderError::unsupported("expense reports", ProviderKind::Venmo).into();
        assert_eq!(err.code, ErrorCode::UnsupportedOperation);

        let err: DomainError = ProviderError::connection("probe failed").into();
        assert_eq!(err.code, ErrorCode::ConnectionFailed);
    }

    #[test]
    fn default_watermark_is_thirty_days_back() {
        let watermark = sync_watermark(None);
        let expected = Timestamp::now().minus_days(30);
        let delta = (watermark.unix_seconds() - expected.unix_seconds()).abs();
        assert!(delta <= 1);
    }

    #[test]
    fn explicit_watermark_is_preserved() {
        let since = Timestamp::now().minus_days(7);
        assert_eq!(sync_watermark(Some(since)), since);
    }
}
