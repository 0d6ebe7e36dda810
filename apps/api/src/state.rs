use std::sync::Arc;

use crate::config::Config;
use crate::gateway::AiGateway;
use crate::paywall::{PaymentProcessor, PaywallPolicy};
use crate::pipeline::sessions::SessionRegistry;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable record store. Postgres when DATABASE_URL is set, in-memory otherwise.
    pub store: Arc<dyn RecordStore>,
    /// The only path to the model provider. Default: GeminiClient.
    pub gateway: Arc<dyn AiGateway>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn paywall(&self) -> PaywallPolicy {
        PaywallPolicy {
            enabled: self.config.paywall_enabled,
        }
    }
}
