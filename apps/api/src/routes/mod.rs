pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommend::handlers as recommend_handlers;
use crate::scrape::handlers as scrape_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation pipeline
        .route(
            "/api/v1/recommendations",
            post(recommend_handlers::handle_recommend),
        )
        .route(
            "/api/v1/rate-limit",
            get(recommend_handlers::handle_rate_status),
        )
        // Catalog scraping demo
        .route(
            "/api/v1/catalog/scrape",
            get(scrape_handlers::handle_scrape_catalog),
        )
        .with_state(state)
}
