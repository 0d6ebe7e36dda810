//! Google Gemini backend for the AI gateway (`generateContent` REST endpoint).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts;
use super::{
    finish_optimized_html, parse_analysis_report, AiGateway, AnalysisReport, ChatRole, ChatTurn,
    DocumentInput, GatewayError,
};
use crate::i18n::Language;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fast model for structured analysis.
pub const ANALYZE_MODEL: &str = "gemini-2.5-flash";
/// Higher-quality model for the paid rewrite.
pub const OPTIMIZE_MODEL: &str = "gemini-2.5-pro";
pub const CHAT_MODEL: &str = "gemini-2.5-flash";

const ANALYZE_TEMPERATURE: f32 = 0.1;
const OPTIMIZE_TEMPERATURE: f32 = 0.1;
const CHAT_TEMPERATURE: f32 = 0.7;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

fn text_part(text: impl Into<String>) -> Part {
    Part::Text { text: text.into() }
}

fn document_part(document: &DocumentInput) -> Part {
    Part::Inline {
        inline_data: InlineData {
            mime_type: document.mime_type.clone(),
            data: STANDARD.encode(&document.bytes),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// One `generateContent` round trip. No retry: failures go straight back to the caller.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<Option<String>, GatewayError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayError::Upstream(format!(
                "AI service returned {}: {message}",
                status.as_u16()
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        if let Some(usage) = &body.usage_metadata {
            debug!(
                model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                finish_reason = body.candidates.first().and_then(|c| c.finish_reason.as_deref()),
                "Gemini call succeeded"
            );
        }
        Ok(body.text())
    }
}

#[async_trait]
impl AiGateway for GeminiClient {
    async fn analyze(
        &self,
        document: &DocumentInput,
        language: Language,
    ) -> Result<AnalysisReport, GatewayError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![text_part(prompts::analysis_system(language))],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![document_part(document), text_part(prompts::ANALYZE_REQUEST)],
            }],
            generation_config: GenerationConfig {
                temperature: ANALYZE_TEMPERATURE,
                response_mime_type: Some("application/json"),
            },
        };

        let text = self
            .generate(ANALYZE_MODEL, &request)
            .await?
            .ok_or_else(|| GatewayError::MalformedResponse("empty analysis reply".to_string()))?;
        parse_analysis_report(&text)
    }

    async fn optimize(
        &self,
        document: &DocumentInput,
        language: Language,
        instructions: Option<&str>,
    ) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![text_part(prompts::optimize_system(language))],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    document_part(document),
                    text_part(prompts::optimize_request(instructions)),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: OPTIMIZE_TEMPERATURE,
                response_mime_type: None,
            },
        };

        let text = self.generate(OPTIMIZE_MODEL, &request).await?;
        finish_optimized_html(text.as_deref())
    }

    async fn chat(&self, history: &[ChatTurn], language: Language) -> Result<String, GatewayError> {
        if history.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "chat requires at least one message".to_string(),
            ));
        }

        // Prior turns replay as history; the last turn is the new user message.
        let contents = history
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                }),
                parts: vec![text_part(turn.text.clone())],
            })
            .collect();

        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![text_part(prompts::chat_system(language))],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: CHAT_TEMPERATURE,
                response_mime_type: None,
            },
        };

        Ok(self
            .generate(CHAT_MODEL, &request)
            .await?
            .unwrap_or_default())
    }
}
