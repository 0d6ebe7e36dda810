use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL for the optimization record store. When unset the
    /// service falls back to an in-process store.
    pub database_url: Option<String>,
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// When false every new optimization is created paid and unlocked.
    pub paywall_enabled: bool,
    pub payment_processing_delay_ms: u64,
    pub payment_success_delay_ms: u64,
    pub session_idle_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            paywall_enabled: parse_env("PAYWALL_ENABLED", true)?,
            payment_processing_delay_ms: parse_env("PAYMENT_PROCESSING_DELAY_MS", 2500)?,
            payment_success_delay_ms: parse_env("PAYMENT_SUCCESS_DELAY_MS", 2000)?,
            session_idle_ttl_secs: parse_env("SESSION_IDLE_TTL_SECS", 3600)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
