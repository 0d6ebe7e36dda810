use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, Action, CurrentUser, Role};
use crate::errors::AppError;
use crate::models::optimization::OptimizationRecord;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    pub role: Role,
    pub allowed: Vec<Action>,
}

/// GET /api/v1/admin/capabilities
/// Lists the actions the caller's role may perform.
pub async fn handle_capabilities(user: CurrentUser) -> Json<CapabilitiesResponse> {
    let allowed = Action::ALL
        .into_iter()
        .filter(|action| authorize(user.role, *action))
        .collect();
    Json(CapabilitiesResponse {
        role: user.role,
        allowed,
    })
}

/// GET /api/v1/admin/optimizations
pub async fn handle_list_optimizations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<OptimizationRecord>>, AppError> {
    user.require(Action::ViewAllOptimizations)?;
    Ok(Json(state.store.list_all().await?))
}

/// POST /api/v1/admin/optimizations/:id/paid
/// Manual unlock, e.g. after an out-of-band payment.
pub async fn handle_mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    user.require(Action::MarkOptimizationPaid)?;
    state.store.mark_paid(id).await?;
    info!("Optimization {id} marked paid by {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}
