//! HTTP handlers for funding source endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::application::IntegrationRegistry;
use crate::domain::integration::ProviderKind;

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiResponse};
use super::dto::{
    parse_source_id, AddFundsRequest, CallbackQuery, ConnectResponse, PaymentLinkRequest,
    ValidateResponse,
};

/// Shared state for funding routes.
#[derive(Clone)]
pub struct FundingAppState {
    pub registry: Arc<IntegrationRegistry>,
}

pub async fn list_sources(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let sources = state.registry.get_funding_sources(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(sources)))
}

pub async fn connect_source(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = ProviderKind::from_str(&provider)?;
    let (url, oauth_state) = state
        .registry
        .wallet_auth_url(provider, &user.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(ConnectResponse {
        url,
        state: oauth_state,
    })))
}

pub async fn oauth_callback(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = ProviderKind::from_str(&provider)?;
    let (code, oauth_state) = query.require()?;
    let source = state
        .registry
        .handle_wallet_callback(provider, &code, &oauth_state, &user.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(source)))
}

pub async fn disconnect_source(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path(source_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = parse_source_id(&source_id)?;
    state
        .registry
        .disconnect_funding_source(&user.user_id, &source_id)
        .await?;
    Ok(Json(ApiResponse::ok_empty()))
}

pub async fn validate_source(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path(source_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = parse_source_id(&source_id)?;
    let valid = state
        .registry
        .validate_funding_source(&user.user_id, &source_id)
        .await?;
    Ok(Json(ApiResponse::ok(ValidateResponse { valid })))
}

pub async fn add_funds(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<AddFundsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = parse_source_id(&request.source_id)?;
    let link = state
        .registry
        .add_funds(
            &user.user_id,
            &source_id,
            request.amount,
            &request.currency,
            request.note.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(link)))
}

pub async fn create_payment_link(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path((provider, source_id)): Path<(String, String)>,
    Json(request): Json<PaymentLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = ProviderKind::from_str(&provider)?;
    let source_id = parse_source_id(&source_id)?;
    let link = state
        .registry
        .create_payment_link(
            &user.user_id,
            provider,
            &source_id,
            request.amount,
            &request.currency,
            request.note.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(link)))
}

pub async fn capture_order(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path((source_id, order_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = parse_source_id(&source_id)?;
    let result = state
        .registry
        .capture_paypal_order(&user.user_id, &source_id, &order_id)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn wallet_balance(
    State(state): State<FundingAppState>,
    user: AuthenticatedUser,
    Path((provider, source_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = ProviderKind::from_str(&provider)?;
    let source_id = parse_source_id(&source_id)?;
    let balance = state
        .registry
        .wallet_balance(&user.user_id, provider, &source_id)
        .await?;
    Ok(Json(ApiResponse::ok(balance)))
}
