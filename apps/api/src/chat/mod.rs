//! Career consultant chat over the gateway's `chat` operation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::gateway::{AiGateway, ChatRole, ChatTurn};
use crate::i18n::Language;

pub mod handlers;

/// Only the most recent turns are sent to the model.
pub const MAX_CHAT_TURNS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub lang: Language,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    /// True when the model call failed and `reply` is the canned apology.
    pub fallback: bool,
}

pub fn recent_turns(history: &[ChatTurn]) -> &[ChatTurn] {
    &history[history.len().saturating_sub(MAX_CHAT_TURNS)..]
}

/// Sends the conversation and returns the reply. Gateway failures never
/// surface as errors here: the user gets the localized fallback instead.
pub async fn converse(
    gateway: &dyn AiGateway,
    history: &[ChatTurn],
    language: Language,
) -> Result<ChatReply, AppError> {
    match history.last() {
        Some(turn) if turn.role == ChatRole::User && !turn.text.trim().is_empty() => {}
        _ => {
            return Err(AppError::Validation(
                "The last message must be a non-empty user message".to_string(),
            ))
        }
    }

    match gateway.chat(recent_turns(history), language).await {
        Ok(reply) => Ok(ChatReply {
            reply,
            fallback: false,
        }),
        Err(e) => {
            warn!("Chat reply failed: {e}");
            Ok(ChatReply {
                reply: language.messages().chat_fallback.to_string(),
                fallback: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::gateway::GatewayError;
    use crate::test_support::FakeGateway;

    fn turn(role: ChatRole, text: &str) -> ChatTurn {
        ChatTurn {
            role,
            text: text.to_string(),
        }
    }

    fn conversation(len: usize) -> Vec<ChatTurn> {
        (0..len)
            .map(|i| {
                let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
                turn(role, &format!("message {i}"))
            })
            .collect()
    }

    #[test]
    fn test_recent_turns_keeps_last_ten() {
        let history = conversation(15);
        let recent = recent_turns(&history);
        assert_eq!(recent.len(), MAX_CHAT_TURNS);
        assert_eq!(recent[0].text, "message 5");
        assert_eq!(recent_turns(&history[..3]).len(), 3);
    }

    #[tokio::test]
    async fn test_converse_sends_truncated_history() {
        let gateway = FakeGateway::new();
        let reply = converse(&gateway, &conversation(13), Language::En)
            .await
            .unwrap();
        assert!(!reply.fallback);
        assert_eq!(reply.reply, "10 turns; you said: message 12");
    }

    #[tokio::test]
    async fn test_converse_falls_back_on_gateway_error() {
        let gateway = FakeGateway::failing(GatewayError::Upstream("503".into()));
        let reply = converse(&gateway, &conversation(1), Language::Ar)
            .await
            .unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.reply, Language::Ar.messages().chat_fallback);
    }

    #[tokio::test]
    async fn test_converse_requires_user_message_last() {
        let gateway = FakeGateway::new();
        assert!(converse(&gateway, &[], Language::En).await.is_err());
        assert!(converse(&gateway, &conversation(2), Language::En).await.is_err());
        assert!(converse(&gateway, &[turn(ChatRole::User, "  ")], Language::En)
            .await
            .is_err());
        assert_eq!(gateway.chat_calls.load(Ordering::SeqCst), 0);
    }
}
