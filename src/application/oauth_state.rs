//! HMAC-signed OAuth state parameters.
//!
//! The `state` value round-trips through the provider's authorization
//! redirect; signing it binds the callback to the initiating user and
//! provider and bounds its age.
//!
//! # Security
//!
//! - HMAC-SHA256 over the payload with constant-time comparison
//! - Issued-at timestamps are validated against a freshness window to
//!   prevent replay

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::integration::ProviderKind;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for a state parameter (10 minutes).
const MAX_STATE_AGE_SECS: i64 = 600;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct StatePayload {
    user_id: String,
    provider: ProviderKind,
    issued_at: i64,
    nonce: String,
}

/// Issues and verifies signed OAuth state parameters.
#[derive(Clone)]
pub struct OAuthStateSigner {
    secret: SecretString,
}

impl OAuthStateSigner {
    /// Creates a signer over the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Issues a state parameter binding the user and provider.
    pub fn issue(&self, user_id: &UserId, provider: ProviderKind) -> String {
        let payload = StatePayload {
            user_id: user_id.as_str().to_string(),
            provider,
            issued_at: Timestamp::now().unix_seconds(),
            nonce: Uuid::new_v4().to_string(),
        };
        // Serializing a struct of plain fields cannot fail.
        let bytes = serde_json::to_vec(&payload).expect("state payload serialization");
        let signature = self.sign(&bytes);
        format!("{}.{}", hex_encode(&bytes), hex_encode(&signature))
    }

    /// Verifies a state parameter against the expected user and provider.
    pub fn verify(
        &self,
        state: &str,
        user_id: &UserId,
        provider: ProviderKind,
    ) -> Result<(), DomainError> {
        let (payload_hex, signature_hex) = state
            .split_once('.')
            .ok_or_else(|| invalid_state("malformed state parameter"))?;
        let payload_bytes =
            hex_decode(payload_hex).ok_or_else(|| invalid_state("malformed state payload"))?;
        let signature =
            hex_decode(signature_hex).ok_or_else(|| invalid_state("malformed state signature"))?;

        let expected = self.sign(&payload_bytes);
        if expected.ct_eq(signature.as_slice()).unwrap_u8() != 1 {
            tracing::warn!("OAuth state signature mismatch");
            return Err(invalid_state("state signature mismatch"));
        }

        let payload: StatePayload = serde_json::from_slice(&payload_bytes)
            .map_err(|_| invalid_state("malformed state payload"))?;

        if payload.user_id != user_id.as_str() {
            return Err(invalid_state("state was issued for a different user"));
        }
        if payload.provider != provider {
            return Err(invalid_state("state was issued for a different provider"));
        }

        let age = Timestamp::now().unix_seconds() - payload.issued_at;
        if age > MAX_STATE_AGE_SECS {
            tracing::warn!(age_secs = age, "expired OAuth state");
            return Err(invalid_state("state has expired"));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!("OAuth state issued in the future");
            return Err(invalid_state("state timestamp is in the future"));
        }

        Ok(())
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn invalid_state(message: &str) -> DomainError {
    DomainError::new(ErrorCode::InvalidOAuthState, message)
}

/// Hex-encodes bytes.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hex-decodes a string; `None` on malformed input.
pub(crate) fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> OAuthStateSigner {
        OAuthStateSigner::new("test-secret-key-material")
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn issued_state_verifies() {
        let signer = signer();
        let state = signer.issue(&user(), ProviderKind::PayPal);
        assert!(signer.verify(&state, &user(), ProviderKind::PayPal).is_ok());
    }

    #[test]
    fn state_is_bound_to_user() {
        let signer = signer();
        let state = signer.issue(&user(), ProviderKind::PayPal);
        let other = UserId::new("user-2").unwrap();
        let err = signer
            .verify(&state, &other, ProviderKind::PayPal)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOAuthState);
    }

    #[test]
    fn state_is_bound_to_provider() {
        let signer = signer();
        let state = signer.issue(&user(), ProviderKind::PayPal);
        assert!(signer.verify(&state, &user(), ProviderKind::Venmo).is_err());
    }

    #[test]
    fn tampered_state_is_rejected() {
        let signer = signer();
        let state = signer.issue(&user(), ProviderKind::PayPal);
        let mut tampered = state.clone();
        // Flip one hex digit in the payload half.
        let replacement = if tampered.starts_with('0') { "1" } else { "0" };
        tampered.replace_range(0..1, replacement);
        assert!(signer
            .verify(&tampered, &user(), ProviderKind::PayPal)
            .is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let state = signer().issue(&user(), ProviderKind::CashApp);
        let other = OAuthStateSigner::new("a-different-secret");
        assert!(other
            .verify(&state, &user(), ProviderKind::CashApp)
            .is_err());
    }

    #[test]
    fn garbage_states_are_rejected() {
        let signer = signer();
        for garbage in ["", "no-dot", "zz.zz", "abc.def.ghi"] {
            assert!(
                signer.verify(garbage, &user(), ProviderKind::PayPal).is_err(),
                "{:?} should be rejected",
                garbage
            );
        }
    }

    #[test]
    fn hex_round_trips() {
        let bytes = vec![0x00, 0x7f, 0xff, 0x10];
        assert_eq!(hex_decode(&hex_encode(&bytes)), Some(bytes));
        assert_eq!(hex_decode("abc"), None);
        assert_eq!(hex_decode("zz"), None);
    }
}
