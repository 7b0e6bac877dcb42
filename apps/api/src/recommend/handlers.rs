//! Axum route handlers for the recommendation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::recommend::models::ResponseEnvelope;
use crate::recommend::pipeline::{recommend_assessments, RecommendationOutcome};
use crate::recommend::rate_limit::RateStatus;
use crate::scrape::fetch_job_description;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub job_description_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    #[serde(flatten)]
    pub envelope: ResponseEnvelope,
    /// Raw model reply, echoed for debug display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_reply: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommendations
///
/// Runs the full pipeline for a job description given as text, or as a URL
/// to fetch it from. Pipeline failures come back as an error envelope, not
/// an HTTP error; only input validation rejects the request itself.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let job_description = resolve_job_description(&state, request).await?;
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job description must not be empty".to_string(),
        ));
    }

    let RecommendationOutcome {
        envelope,
        raw_reply,
    } = recommend_assessments(
        &state.llm,
        &state.limiter,
        state.config.rate_limit_policy,
        &job_description,
    )
    .await?;

    Ok(Json(RecommendResponse {
        envelope,
        raw_reply,
    }))
}

/// GET /api/v1/rate-limit
///
/// Current occupancy of the model-call window, for status display.
pub async fn handle_rate_status(State(state): State<AppState>) -> Json<RateStatus> {
    Json(state.limiter.occupancy())
}

async fn resolve_job_description(
    state: &AppState,
    request: RecommendRequest,
) -> Result<String, AppError> {
    match (request.job_description, request.job_description_url) {
        (Some(_), Some(_)) => Err(AppError::Validation(
            "provide job_description or job_description_url, not both".to_string(),
        )),
        (Some(text), None) => Ok(text),
        (None, Some(url)) => fetch_job_description(&state.http, &url).await,
        (None, None) => Err(AppError::Validation(
            "job_description or job_description_url is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::models::{RecommendationRecord, Support};

    #[test]
    fn test_response_flattens_envelope_and_skips_missing_raw_reply() {
        let envelope = ResponseEnvelope::success(
            "ok",
            vec![RecommendationRecord {
                assessment_name: "X".to_string(),
                url: "https://www.shl.com/x".to_string(),
                remote_testing: Support::Yes,
                adaptive_support: Support::No,
                duration: "30 mins".to_string(),
                test_type: "Cognitive".to_string(),
            }],
        );
        let json = serde_json::to_value(RecommendResponse {
            envelope,
            raw_reply: None,
        })
        .unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["data"][0]["assessment_name"], "X");
        assert!(json.get("raw_reply").is_none());
    }

    #[test]
    fn test_response_includes_raw_reply_when_present() {
        let json = serde_json::to_value(RecommendResponse {
            envelope: ResponseEnvelope::error("failed to parse response"),
            raw_reply: Some("not json".to_string()),
        })
        .unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["raw_reply"], "not json");
    }

    #[test]
    fn test_request_accepts_either_input_field() {
        let request: RecommendRequest =
            serde_json::from_str(r#"{"job_description": "a role"}"#).unwrap();
        assert_eq!(request.job_description.as_deref(), Some("a role"));
        assert!(request.job_description_url.is_none());

        let request: RecommendRequest =
            serde_json::from_str(r#"{"job_description_url": "https://example.com/jd"}"#).unwrap();
        assert!(request.job_description.is_none());
        assert_eq!(
            request.job_description_url.as_deref(),
            Some("https://example.com/jd")
        );
    }
}
