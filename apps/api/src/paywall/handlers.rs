use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::paywall::{confirm_payment, CardDetails};
use crate::pipeline::session::SessionView;
use crate::state::AppState;

/// POST /api/v1/sessions/:id/payment
/// Charges the unlock price and, once settled, unlocks the session's document.
pub async fn handle_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
    Json(card): Json<CardDetails>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let view = confirm_payment(
        state.payments.as_ref(),
        state.store.as_ref(),
        &handle,
        card,
    )
    .await?;
    Ok(Json(view))
}
