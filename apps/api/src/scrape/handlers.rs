//! Axum route handler for the catalog scraping demo.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::scrape::{fetch_page, ScrapedPage, CATALOG_URL};
use crate::state::AppState;

/// GET /api/v1/catalog/scrape
///
/// Fetches the fixed product-catalog page and returns its readable text and
/// links. Demo display only; the recommendation pipeline does not consume
/// this.
pub async fn handle_scrape_catalog(
    State(state): State<AppState>,
) -> Result<Json<ScrapedPage>, AppError> {
    let page = fetch_page(&state.http, CATALOG_URL).await?;
    Ok(Json(page))
}
