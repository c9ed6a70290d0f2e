//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `CARDPILOT_` prefix and nested values use double underscores as
//! separators (e.g. `CARDPILOT_SERVER__PORT=8080`).
//!
//! # Example
//!
//! ```no_run
//! use cardpilot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod auth;
mod error;
mod providers;
mod server;

pub use auth::AuthConfig;
pub use error::{ConfigError, ValidationError};
pub use providers::{ProvidersConfig, WalletProviderConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication and state-signing configuration
    pub auth: AuthConfig,

    /// Wallet provider credentials for the OAuth funding flows
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads a `.env` file first when present (development convenience),
    /// then environment variables with the `CARDPILOT` prefix.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CARDPILOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigError::Load)?;

        settings.try_deserialize().map_err(ConfigError::Load)
    }

    /// Validates every configuration section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.providers.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sections_validate() {
        let config = AppConfig {
            server: ServerConfig::default(),
            auth: AuthConfig {
                oauth_state_secret: "0123456789abcdef0123456789abcdef".to_string(),
            },
            providers: ProvidersConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
