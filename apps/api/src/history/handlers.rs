use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::history::list_history;
use crate::models::optimization::OptimizationSummary;
use crate::pipeline::runner::resume_from_history;
use crate::pipeline::session::SessionView;
use crate::state::AppState;

/// GET /api/v1/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Json<Vec<OptimizationSummary>> {
    Json(list_history(state.store.as_ref(), &user.id).await)
}

/// POST /api/v1/sessions/:id/history/:record_id
/// Opens a previous optimization straight into the completed view.
pub async fn handle_select_history(
    State(state): State<AppState>,
    Path((id, record_id)): Path<(Uuid, Uuid)>,
    user: CurrentUser,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, Some(&user)).await?;
    let view = resume_from_history(
        state.store.as_ref(),
        state.paywall(),
        &handle,
        &user.id,
        record_id,
    )
    .await?;
    Ok(Json(view))
}
