//! HTTP DTOs for funding source endpoints.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{DomainError, FundingSourceId};

/// Response for the connect endpoint: redirect target plus signed state.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectResponse {
    pub url: String,
    pub state: String,
}

/// Query parameters on the OAuth redirect target.
///
/// Both fields are required; they are optional here so a missing one maps
/// to a validation error inside the envelope rather than an extractor
/// rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl CallbackQuery {
    /// Extracts the required parameters.
    pub fn require(self) -> Result<(String, String), DomainError> {
        let code = self
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::validation("code", "missing authorization code"))?;
        let state = self
            .state
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::validation("state", "missing state parameter"))?;
        Ok((code, state))
    }
}

/// Request for a payment link.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLinkRequest {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request to add funds through a connected source.
#[derive(Debug, Clone, Deserialize)]
pub struct AddFundsRequest {
    pub source_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Validation outcome for a funding source.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// Parses a funding source id path segment.
pub fn parse_source_id(raw: &str) -> Result<FundingSourceId, DomainError> {
    FundingSourceId::from_str(raw)
        .map_err(|_| DomainError::validation("source_id", "must be a UUID"))
}
