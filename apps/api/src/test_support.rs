//! In-memory fakes behind the service traits, shared by unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::Config;
use crate::gateway::{
    AiGateway, AnalysisReport, AtsCompatibility, ChatTurn, DocumentInput, GatewayError,
};
use crate::i18n::Language;
use crate::models::optimization::{NewOptimization, OptimizationRecord};
use crate::paywall::SimulatedProcessor;
use crate::pipeline::sessions::SessionRegistry;
use crate::state::AppState;
use crate::store::{RecordStore, StoreError};

pub const OPTIMIZED_HTML: &str = r#"<!DOCTYPE html><html dir="ltr"><head><style>body{font-family:Arial}</style></head><body><h1>Jane Doe</h1><h2>Experience</h2><ul><li>Cut deploy time by 40%</li></ul><p>Lead engineer &amp; mentor</p></body></html>"#;

#[derive(Default)]
pub struct FakeGateway {
    pub analyze_calls: AtomicUsize,
    pub optimize_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub last_instructions: Mutex<Option<String>>,
    analyze_error: Option<GatewayError>,
    optimize_error: Option<GatewayError>,
    chat_error: Option<GatewayError>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with `error`.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            analyze_error: Some(error.clone()),
            optimize_error: Some(error.clone()),
            chat_error: Some(error),
            ..Self::default()
        }
    }

    pub fn with_optimize_error(mut self, error: GatewayError) -> Self {
        self.optimize_error = Some(error);
        self
    }
}

#[async_trait]
impl AiGateway for FakeGateway {
    async fn analyze(
        &self,
        _document: &DocumentInput,
        _language: Language,
    ) -> Result<AnalysisReport, GatewayError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.analyze_error {
            return Err(e.clone());
        }
        Ok(AnalysisReport {
            score: 58,
            grammar_issues: vec!["Inconsistent tense".into()],
            structure_gaps: vec!["Missing summary".into()],
            ats_compatibility: AtsCompatibility::Medium,
            impact_optimizations: vec!["Quantify results".into()],
            summary: "Optimizing will raise your interview rate.".into(),
        })
    }

    async fn optimize(
        &self,
        _document: &DocumentInput,
        _language: Language,
        instructions: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_instructions.lock().unwrap() = instructions.map(str::to_string);
        if let Some(e) = &self.optimize_error {
            return Err(e.clone());
        }
        Ok(OPTIMIZED_HTML.to_string())
    }

    async fn chat(&self, history: &[ChatTurn], _language: Language) -> Result<String, GatewayError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.chat_error {
            return Err(e.clone());
        }
        let last = history.last().map(|t| t.text.as_str()).unwrap_or_default();
        Ok(format!("{} turns; you said: {last}", history.len()))
    }
}

/// A store whose backend is always down.
pub struct FailingStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn create(&self, _new: NewOptimization) -> Result<OptimizationRecord, StoreError> {
        Err(down())
    }

    async fn find_recent(
        &self,
        _owner_id: &str,
        _filename: &str,
    ) -> Result<Option<OptimizationRecord>, StoreError> {
        Err(down())
    }

    async fn get(&self, _id: Uuid) -> Result<Option<OptimizationRecord>, StoreError> {
        Err(down())
    }

    async fn mark_paid(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(down())
    }

    async fn list_by_owner(&self, _owner_id: &str) -> Result<Vec<OptimizationRecord>, StoreError> {
        Err(down())
    }

    async fn list_all(&self) -> Result<Vec<OptimizationRecord>, StoreError> {
        Err(down())
    }
}

pub fn test_config(paywall_enabled: bool) -> Config {
    Config {
        database_url: None,
        gemini_api_key: "test-key".into(),
        port: 0,
        rust_log: "debug".into(),
        paywall_enabled,
        payment_processing_delay_ms: 0,
        payment_success_delay_ms: 0,
        session_idle_ttl_secs: 3600,
    }
}

pub fn app_state(gateway: Arc<dyn AiGateway>, store: Arc<dyn RecordStore>) -> AppState {
    AppState {
        store,
        gateway,
        payments: Arc::new(SimulatedProcessor::new(Duration::ZERO, Duration::ZERO)),
        sessions: SessionRegistry::new(),
        config: test_config(true),
    }
}
