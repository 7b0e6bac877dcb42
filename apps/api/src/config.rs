use anyhow::{anyhow, Context, Result};

use crate::recommend::pipeline::BlockPolicy;
use crate::recommend::rate_limit::{MAX_REQUESTS_PER_WINDOW, RATE_WINDOW};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub rate_limit_policy: BlockPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rate_limit_max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| MAX_REQUESTS_PER_WINDOW.to_string())
                .parse::<usize>()
                .context("RATE_LIMIT_MAX_REQUESTS must be a positive integer")?,
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| RATE_WINDOW.as_secs().to_string())
                .parse::<u64>()
                .context("RATE_LIMIT_WINDOW_SECS must be a positive integer")?,
            rate_limit_policy: std::env::var("RATE_LIMIT_POLICY")
                .unwrap_or_else(|_| "fail-fast".to_string())
                .parse::<BlockPolicy>()
                .map_err(|e| anyhow!(e))
                .context("RATE_LIMIT_POLICY must be 'fail-fast' or 'wait'")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
