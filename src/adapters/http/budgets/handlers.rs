//! HTTP handlers for budget and notification endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::notify::InMemoryNotifier;
use crate::application::BudgetService;
use crate::domain::foundation::{BudgetId, DomainError};

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiResponse};
use super::dto::{CreateBudgetRequest, RecordSpendingRequest, SpendingResponse};

/// Shared state for budget and notification routes.
#[derive(Clone)]
pub struct BudgetsAppState {
    pub service: Arc<BudgetService>,
    pub notifications: Arc<InMemoryNotifier>,
}

fn parse_budget_id(raw: &str) -> Result<BudgetId, ApiError> {
    BudgetId::from_str(raw)
        .map_err(|_| DomainError::validation("budget_id", "must be a UUID").into())
}

pub async fn create_budget(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (start, end) = request.dates()?;
    let budget = state
        .service
        .create_budget(
            user.user_id,
            request.category,
            request.target_amount,
            request.period,
            start,
            end,
            request.thresholds,
            request.alerts_enabled,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(budget))))
}

pub async fn list_budgets(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let budgets = state.service.list_budgets(&user.user_id).await?;
    Ok(Json(ApiResponse::ok(budgets)))
}

pub async fn get_budget(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_budget_id(&id)?;
    let budget = state.service.get_budget(&user.user_id, &id).await?;
    Ok(Json(ApiResponse::ok(budget)))
}

pub async fn delete_budget(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_budget_id(&id)?;
    state.service.delete_budget(&user.user_id, &id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

pub async fn record_spending(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<RecordSpendingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_budget_id(&id)?;
    let evaluation = state
        .service
        .record_spending(&user.user_id, &id, request.amount)
        .await?;
    Ok(Json(ApiResponse::ok(SpendingResponse {
        spending_percentage: evaluation.spending_percentage,
        alerts: evaluation.alerts,
    })))
}

pub async fn list_notifications(
    State(state): State<BudgetsAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = state.notifications.recorded_for_user(&user.user_id).await;
    Ok(Json(ApiResponse::ok(alerts)))
}
