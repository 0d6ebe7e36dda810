use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::{converse, ChatReply, ChatRequest};
use crate::errors::AppError;
use crate::i18n::Language;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    pub lang: Language,
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = converse(state.gateway.as_ref(), &req.messages, req.lang).await?;
    Ok(Json(reply))
}

/// GET /api/v1/chat/welcome
pub async fn handle_welcome(Query(query): Query<LangQuery>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: query.lang.messages().chat_welcome,
    })
}
