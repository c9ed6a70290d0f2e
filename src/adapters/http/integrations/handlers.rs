//! HTTP handlers for integration endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::IntegrationRegistry;
use crate::domain::foundation::{DomainError, IntegrationId};

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiResponse};
use super::dto::{AddIntegrationRequest, ReportRequest, StatusResponse, SyncQuery};

/// Shared state for integration routes.
#[derive(Clone)]
pub struct IntegrationsAppState {
    pub registry: Arc<IntegrationRegistry>,
}

fn parse_id(id: String) -> Result<IntegrationId, ApiError> {
    IntegrationId::new(id)
        .map_err(DomainError::from)
        .map_err(ApiError::from)
}

pub async fn add_integration(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Json(request): Json<AddIntegrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let config = request.into_config()?;
    let view = state.registry.add_integration(config).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

pub async fn list_integrations(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let views = state.registry.list_integrations().await?;
    Ok(Json(ApiResponse::ok(views)))
}

pub async fn remove_integration(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    state.registry.remove_integration(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

pub async fn sync_integration(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<SyncQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let since = query.since()?;
    let result = state.registry.sync_integration(&id, since).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn integration_status(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let status = state.registry.get_integration_status(&id).await?;
    Ok(Json(ApiResponse::ok(StatusResponse { id, status })))
}

pub async fn create_report(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let report = request.into_report(String::new());
    let created = state.registry.create_expense_report(&id, &report).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn get_report(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path((id, report_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let report = state.registry.get_expense_report(&id, &report_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn update_report(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path((id, report_id)): Path<(String, String)>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let report = request.into_report(report_id);
    let updated = state.registry.update_expense_report(&id, &report).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn plaid_link_token(
    State(state): State<IntegrationsAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let handle = state.registry.plaid_handle(&id).await?;
    let token = handle.create_link_token(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(token)))
}

pub async fn plaid_account_balance(
    State(state): State<IntegrationsAppState>,
    _user: AuthenticatedUser,
    Path((id, account_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(id)?;
    let handle = state.registry.plaid_handle(&id).await?;
    let balance = handle.account_balance(&account_id).await?;
    Ok(Json(ApiResponse::ok(balance)))
}
