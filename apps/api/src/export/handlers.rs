use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::export::docx::{render_docx, DOCX_CONTENT_TYPE, DOCX_FILENAME};
use crate::export::html::to_plain_text;
use crate::export::print::render_print_document;
use crate::i18n::Language;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ExportQuery {
    /// Overrides the surface direction; defaults to the session's output language.
    pub lang: Option<Language>,
}

/// Canonical HTML of an unlocked, completed document plus the session language.
/// Locked documents yield `PaymentRequired` and nothing else.
async fn unlocked_html(
    state: &AppState,
    id: Uuid,
    user: Option<&CurrentUser>,
) -> Result<(String, Language), AppError> {
    let handle = state.sessions.acquire(id, user).await?;
    let session = handle.lock().await;
    let document = session.unlocked_document()?;
    Ok((document.html.clone(), session.language()))
}

/// GET /api/v1/sessions/:id/export/pdf
/// Print-ready page; the client opens it in a new window and the browser prints to PDF.
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let (html, _) = unlocked_html(&state, id, user.as_ref()).await?;
    Ok(Html(render_print_document(&html)))
}

/// GET /api/v1/sessions/:id/export/docx
pub async fn handle_export_docx(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let (html, session_language) = unlocked_html(&state, id, user.as_ref()).await?;
    let language = query.lang.unwrap_or(session_language);

    let bytes = render_docx(&html, language.direction()).map_err(|e| {
        error!("Session {id}: {e}");
        AppError::Conversion(language.messages().docx_failed.to_string())
    })?;
    info!("Session {id}: exported DOCX ({} bytes, {:?})", bytes.len(), language);

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOCX_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/sessions/:id/export/text
pub async fn handle_export_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let (html, _) = unlocked_html(&state, id, user.as_ref()).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        to_plain_text(&html),
    )
        .into_response())
}

/// GET /api/v1/sessions/:id/export/html
pub async fn handle_export_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let (html, _) = unlocked_html(&state, id, user.as_ref()).await?;
    Ok(Html(html))
}
