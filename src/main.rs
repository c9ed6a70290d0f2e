//! Cardpilot server entry point.
//!
//! Composition root: loads configuration, builds the in-memory stores,
//! the provider factory, the integration registry and budget service, and
//! serves the API router.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cardpilot::adapters::http::api_router;
use cardpilot::adapters::notify::InMemoryNotifier;
use cardpilot::adapters::providers::HttpProviderFactory;
use cardpilot::adapters::storage::{
    InMemoryBudgetStore, InMemoryFundingSourceStore, InMemoryIntegrationStore,
};
use cardpilot::application::{
    BudgetService, IntegrationRegistry, OAuthStateSigner, WalletCredentials,
};
use cardpilot::config::{AppConfig, ProvidersConfig, WalletProviderConfig};
use cardpilot::domain::integration::ProviderKind;
use secrecy::SecretString;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardpilot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let notifier = Arc::new(InMemoryNotifier::new());
    let registry = Arc::new(IntegrationRegistry::new(
        Arc::new(InMemoryIntegrationStore::new()),
        Arc::new(InMemoryFundingSourceStore::new()),
        Arc::new(HttpProviderFactory::new()),
        OAuthStateSigner::new(config.auth.oauth_state_secret.clone()),
        wallet_credentials(&config.providers),
    ));
    let budgets = Arc::new(BudgetService::new(
        Arc::new(InMemoryBudgetStore::new()),
        notifier.clone(),
    ));

    let app = api_router(registry, budgets, notifier)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "starting server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Converts configured wallet sections into registry credentials.
fn wallet_credentials(
    providers: &ProvidersConfig,
) -> HashMap<ProviderKind, WalletCredentials> {
    let mut map = HashMap::new();
    let sections = [
        (ProviderKind::PayPal, &providers.paypal),
        (ProviderKind::Venmo, &providers.venmo),
        (ProviderKind::CashApp, &providers.cashapp),
    ];
    for (kind, section) in sections {
        if let Some(section) = section {
            map.insert(kind, to_credentials(section));
        }
    }
    map
}

fn to_credentials(section: &WalletProviderConfig) -> WalletCredentials {
    WalletCredentials {
        client_id: section.client_id.clone(),
        client_secret: SecretString::new(section.client_secret.clone()),
        redirect_uri: section.redirect_uri.clone(),
        access_token: section
            .access_token
            .clone()
            .map(SecretString::new),
        handle: section.handle.clone(),
    }
}
