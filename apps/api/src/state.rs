use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::recommend::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: GeminiClient,
    /// Process-wide model-call window, shared across concurrent requests.
    pub limiter: Arc<RateLimiter>,
    /// Shared HTTP client for page fetches (catalog scrape, JD-from-URL).
    pub http: reqwest::Client,
    pub config: Config,
}
