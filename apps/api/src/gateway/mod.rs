/// AI Gateway — the single point of contact with the generative model.
///
/// ARCHITECTURAL RULE: no other module talks to the model provider directly.
/// Analyze, optimize and chat all go through an `AiGateway` implementation;
/// production uses `GeminiClient`, tests plug in fakes.
///
/// Gateway calls are never retried automatically. A failed call surfaces to
/// the pipeline, which moves the session to `Error` and waits for a reset.
use std::borrow::Cow;

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::i18n::Language;

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

/// Optimized output shorter than this is treated as unusable.
pub const MIN_OPTIMIZED_LEN: usize = 50;
/// Upper bound on each list in an analysis report.
pub const MAX_REPORT_ITEMS: usize = 3;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The remote call itself failed: transport, quota, auth, 5xx.
    #[error("{0}")]
    Upstream(String),

    /// The model replied, but not with the structure we asked for.
    #[error("The AI response could not be understood: {0}")]
    MalformedResponse(String),

    /// The model produced nothing usable.
    #[error("The AI returned an empty or insufficient response. Please ensure the uploaded file is a clear resume.")]
    EmptyOutput,

    #[error("{0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Upstream(format!("AI service request failed: {e}"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / response types shared by every gateway backend
// ────────────────────────────────────────────────────────────────────────────

/// An uploaded CV as sent to the model: raw bytes plus MIME type.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub bytes: Bytes,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtsCompatibility {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

/// Structured critique returned by `analyze`. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default)]
    pub grammar_issues: Vec<String>,
    #[serde(default)]
    pub structure_gaps: Vec<String>,
    pub ats_compatibility: AtsCompatibility,
    #[serde(default)]
    pub impact_optimizations: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !(0.0..=100.0).contains(&raw) {
        return Err(serde::de::Error::custom(format!(
            "score {raw} is outside 0-100"
        )));
    }
    Ok(raw.round() as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Carried in `AppState` as `Arc<dyn AiGateway>`.
#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn analyze(
        &self,
        document: &DocumentInput,
        language: Language,
    ) -> Result<AnalysisReport, GatewayError>;

    async fn optimize(
        &self,
        document: &DocumentInput,
        language: Language,
        instructions: Option<&str>,
    ) -> Result<String, GatewayError>;

    /// `history` must already be truncated by the caller; the last turn is the new message.
    async fn chat(&self, history: &[ChatTurn], language: Language) -> Result<String, GatewayError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Response normalization
// ────────────────────────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").unwrap());

/// Removes every markdown code fence (```` ```json ````, ```` ```html ````, bare
/// ```` ``` ````) the model may have wrapped around its output.
pub fn strip_code_fences(text: &str) -> Cow<'_, str> {
    if !text.contains("```") {
        return Cow::Borrowed(text.trim());
    }
    Cow::Owned(RE_FENCE.replace_all(text, "").trim().to_string())
}

/// Parses the analyze reply into a report, truncating over-long lists.
pub fn parse_analysis_report(text: &str) -> Result<AnalysisReport, GatewayError> {
    let text = strip_code_fences(text);
    let mut report: AnalysisReport = serde_json::from_str(&text)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    report.grammar_issues.truncate(MAX_REPORT_ITEMS);
    report.structure_gaps.truncate(MAX_REPORT_ITEMS);
    report.impact_optimizations.truncate(MAX_REPORT_ITEMS);
    Ok(report)
}

/// Cleans the optimize reply and rejects unusable output.
pub fn finish_optimized_html(text: Option<&str>) -> Result<String, GatewayError> {
    let html = strip_code_fences(text.unwrap_or_default());
    if html.chars().count() < MIN_OPTIMIZED_LEN {
        return Err(GatewayError::EmptyOutput);
    }
    Ok(html.into_owned())
}
