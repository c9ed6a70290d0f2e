//! Authentication and signing configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Minimum acceptable length for the state-signing secret.
const MIN_SECRET_LEN: usize = 16;

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret for HMAC-signing OAuth state parameters.
    pub oauth_state_secret: String,
}

impl AuthConfig {
    /// Validates the authentication configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.oauth_state_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__OAUTH_STATE_SECRET"));
        }
        if self.oauth_state_secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::invalid(
                "AUTH__OAUTH_STATE_SECRET",
                format!("must be at least {} characters", MIN_SECRET_LEN),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_is_rejected() {
        let config = AuthConfig {
            oauth_state_secret: "short".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn long_secret_passes() {
        let config = AuthConfig {
            oauth_state_secret: "0123456789abcdef".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
