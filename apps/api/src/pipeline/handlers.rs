use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::i18n::Language;
use crate::pipeline::runner::{run_analysis, run_optimization};
use crate::pipeline::session::SessionView;
use crate::pipeline::upload::read_upload;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub output_language: Language,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    pub output_language: Language,
}

#[derive(Deserialize, Default)]
pub struct OptimizeRequest {
    pub instructions: Option<String>,
}

/// POST /api/v1/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    req: Option<Json<OpenSessionRequest>>,
) -> (StatusCode, Json<SessionView>) {
    let Json(req) = req.unwrap_or_default();
    let owner_id = user.map(|u| u.id);
    let handle = state.sessions.open(owner_id.clone(), req.output_language);
    let view = handle.lock().await.view();
    info!(
        "Opened session {} for {}",
        view.id,
        owner_id.as_deref().unwrap_or("anonymous")
    );
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let view = handle.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<StatusCode, AppError> {
    state.sessions.acquire(id, user.as_ref()).await?;
    state.sessions.close(id);
    info!("Closed session {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/language
pub async fn handle_set_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let mut session = handle.lock().await;
    session.set_language(req.output_language)?;
    Ok(Json(session.view()))
}

/// POST /api/v1/sessions/:id/upload
/// Multipart field `file`. Validates, then runs the analysis step.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let upload = read_upload(multipart).await?;
    let view = run_analysis(state.gateway.as_ref(), &handle, upload).await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
    req: Option<Json<OptimizeRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let Json(req) = req.unwrap_or_default();
    let view = run_optimization(
        state.gateway.as_ref(),
        state.store.as_ref(),
        state.paywall(),
        &handle,
        req.instructions,
    )
    .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.acquire(id, user.as_ref()).await?;
    let mut session = handle.lock().await;
    session.reset()?;
    Ok(Json(session.view()))
}
