//! Axum router configuration for funding source endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{
    add_funds, capture_order, connect_source, create_payment_link, disconnect_source,
    list_sources, oauth_callback, validate_source, wallet_balance, FundingAppState,
};

/// Create the funding API router.
///
/// # Routes
///
/// - `GET /sources` - List the user's funding sources
/// - `POST /sources/connect/{provider}` - Start a wallet OAuth connect
/// - `GET /sources/callback/{provider}` - OAuth redirect target
/// - `DELETE /sources/{source_id}` - Disconnect a funding source
/// - `GET /sources/{source_id}/validate` - Validate a funding source
/// - `POST /add-funds` - Create an add-funds payment link
/// - `POST /{provider}/{source_id}/payment-link` - Create a payment link
/// - `POST /paypal/{source_id}/capture/{order_id}` - Capture a PayPal order
/// - `GET /{provider}/{source_id}/balance` - Wallet balance
pub fn funding_routes() -> Router<FundingAppState> {
    Router::new()
        .route("/sources", get(list_sources))
        .route("/sources/connect/:provider", post(connect_source))
        .route("/sources/callback/:provider", get(oauth_callback))
        .route("/sources/:source_id", delete(disconnect_source))
        .route("/sources/:source_id/validate", get(validate_source))
        .route("/add-funds", post(add_funds))
        .route("/:provider/:source_id/payment-link", post(create_payment_link))
        .route("/paypal/:source_id/capture/:order_id", post(capture_order))
        .route("/:provider/:source_id/balance", get(wallet_balance))
}
