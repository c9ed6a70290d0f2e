//! Funding sources - a user's connected external payment accounts.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FundingSourceId, Timestamp, UserId};

use super::ProviderKind;

/// External account identity returned by an OAuth code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAccount {
    /// Provider-side account identifier (payer id, user id, cashtag).
    pub account_id: String,
    /// Display label for the account, when the provider offers one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A user's connected external payment account, usable to add funds.
///
/// One user may own many sources, including several for the same provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSource {
    pub id: FundingSourceId,
    pub user_id: UserId,
    pub provider: ProviderKind,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<Timestamp>,
}

impl FundingSource {
    /// Creates a connected funding source from a completed OAuth exchange.
    pub fn connected(user_id: UserId, provider: ProviderKind, account: ExternalAccount) -> Self {
        Self {
            id: FundingSourceId::new(),
            user_id,
            provider,
            connected: true,
            external_account_id: Some(account.account_id),
            last_used_at: None,
        }
    }

    /// Stamps the last-used timestamp.
    pub fn touch(&mut self, at: Timestamp) {
        self.last_used_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn connected_source_carries_account_id() {
        let source = FundingSource::connected(
            user(),
            ProviderKind::PayPal,
            ExternalAccount {
                account_id: "PAYER123".to_string(),
                display_name: Some("alice@example.com".to_string()),
            },
        );
        assert!(source.connected);
        assert_eq!(source.external_account_id.as_deref(), Some("PAYER123"));
        assert!(source.last_used_at.is_none());
    }

    #[test]
    fn touch_stamps_last_used() {
        let mut source = FundingSource::connected(
            user(),
            ProviderKind::Venmo,
            ExternalAccount {
                account_id: "venmo-77".to_string(),
                display_name: None,
            },
        );
        let at = Timestamp::now();
        source.touch(at);
        assert_eq!(source.last_used_at, Some(at));
    }
}
