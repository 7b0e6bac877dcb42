//! The request executor: admission, bounded retries, reply acceptance.
//!
//! One invocation runs attempts strictly in order; the Nth attempt never
//! starts before the (N-1)th has fully resolved. Suspension points are the
//! model call and the backoff/wait sleeps. Every failure kind is converted
//! to a `ResponseEnvelope` here; nothing propagates as a fault past this
//! module except input validation, which fires before anything is recorded.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::llm_client::{GenerativeModel, LlmError};
use crate::recommend::backoff::{backoff_delay, jitter_sample, MAX_ATTEMPTS};
use crate::recommend::models::ResponseEnvelope;
use crate::recommend::normalizer::{classify, normalize, ReplyShape};
use crate::recommend::prompts::build_recommendation_prompt;
use crate::recommend::rate_limit::{Admission, RateLimiter, RATE_WINDOW};

/// What to do when the rate limiter reports a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockPolicy {
    /// Return a rate-limited error envelope naming the wait.
    #[default]
    FailFast,
    /// Sleep out the reported delay (bounded by the window), then clear the
    /// window and proceed.
    Wait,
}

impl std::str::FromStr for BlockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            "wait" => Ok(Self::Wait),
            other => Err(format!("unknown rate limit policy '{other}'")),
        }
    }
}

/// Terminal outcome of a single attempt. The retry loop branches on this
/// tag; no failure is caught generically.
#[derive(Debug)]
enum AttemptOutcome {
    Accepted(String),
    Malformed(String),
    Transient(LlmError),
    Fatal(LlmError),
}

/// Pipeline result: the normalized envelope, plus the raw reply text for
/// debug display whenever a reply was actually received.
#[derive(Debug)]
pub struct RecommendationOutcome {
    pub envelope: ResponseEnvelope,
    pub raw_reply: Option<String>,
}

impl RecommendationOutcome {
    fn without_reply(envelope: ResponseEnvelope) -> Self {
        Self {
            envelope,
            raw_reply: None,
        }
    }
}

/// Runs the full pipeline for one job description: prompt build, admission,
/// up to [`MAX_ATTEMPTS`] model calls with backoff, normalization.
///
/// Malformed replies and transient errors draw from the same attempt
/// budget. Every admission records a timestamp in the limiter's window,
/// whatever the attempt's outcome.
pub async fn recommend_assessments(
    model: &dyn GenerativeModel,
    limiter: &RateLimiter,
    policy: BlockPolicy,
    job_description: &str,
) -> Result<RecommendationOutcome, AppError> {
    // Empty input is rejected before anything is recorded or called.
    let prompt = build_recommendation_prompt(job_description)?;

    let mut last_failure: Option<AttemptOutcome> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let delay = backoff_delay(attempt - 1, jitter_sample());
            warn!(
                "attempt {}/{} failed, retrying after {}ms",
                attempt,
                MAX_ATTEMPTS,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        if let Admission::Blocked { retry_after } = limiter.admit() {
            match policy {
                BlockPolicy::FailFast => {
                    return Ok(RecommendationOutcome::without_reply(
                        ResponseEnvelope::error(format!(
                            "rate limit reached, retry in {}s",
                            retry_after.as_secs().max(1)
                        )),
                    ));
                }
                BlockPolicy::Wait => {
                    wait_out_block(retry_after).await;
                    limiter.clear();
                    let _ = limiter.admit();
                }
            }
        }

        match run_attempt(model, &prompt).await {
            AttemptOutcome::Accepted(raw) => {
                let envelope = normalize(&raw);
                info!(
                    "accepted reply on attempt {} with {} records",
                    attempt,
                    envelope.data.len()
                );
                return Ok(RecommendationOutcome {
                    envelope,
                    raw_reply: Some(raw),
                });
            }
            AttemptOutcome::Malformed(raw) => {
                warn!("attempt {} reply matched no accepted shape", attempt);
                last_failure = Some(AttemptOutcome::Malformed(raw));
            }
            AttemptOutcome::Transient(err) => {
                warn!("attempt {} hit a transient failure: {err}", attempt);
                last_failure = Some(AttemptOutcome::Transient(err));
            }
            AttemptOutcome::Fatal(err) => {
                error!("fatal service failure, not retrying: {err}");
                return Ok(RecommendationOutcome::without_reply(
                    ResponseEnvelope::error(format!("service unavailable: {err}")),
                ));
            }
        }
    }

    Ok(exhausted(last_failure))
}

/// Runs one model call and classifies the result. An unparseable or empty
/// reply is malformed; the model may simply have formatted poorly, so it is
/// retried like a transient error, but reported as a parse failure.
async fn run_attempt(model: &dyn GenerativeModel, prompt: &str) -> AttemptOutcome {
    match model.generate(prompt).await {
        Ok(raw) => match classify(&raw) {
            ReplyShape::Canonical(_) | ReplyShape::LegacyArray(_) => AttemptOutcome::Accepted(raw),
            ReplyShape::Unparseable => AttemptOutcome::Malformed(raw),
        },
        Err(LlmError::EmptyContent) => AttemptOutcome::Malformed(String::new()),
        Err(err) if err.is_transient() => AttemptOutcome::Transient(err),
        Err(err) => AttemptOutcome::Fatal(err),
    }
}

/// Builds the terminal envelope once the attempt budget is spent, keyed on
/// the final failure: parse failures report as such (keeping the raw reply
/// for debugging); quota exhaustion is distinguished from general
/// availability.
fn exhausted(last_failure: Option<AttemptOutcome>) -> RecommendationOutcome {
    match last_failure {
        Some(AttemptOutcome::Malformed(raw)) => RecommendationOutcome {
            envelope: normalize(&raw),
            raw_reply: Some(raw),
        },
        Some(AttemptOutcome::Transient(err)) if err.is_rate_limit() => {
            RecommendationOutcome::without_reply(ResponseEnvelope::error(
                "rate limit exceeded, please wait a moment and retry",
            ))
        }
        _ => RecommendationOutcome::without_reply(ResponseEnvelope::error(
            "service temporarily unavailable, please retry shortly",
        )),
    }
}

/// Sleeps out a reported block in one-second steps, logging progress,
/// bounded by the rate window length.
async fn wait_out_block(retry_after: Duration) {
    let total = retry_after.min(RATE_WINDOW);
    info!("rate limit reached, waiting {}s", total.as_secs());

    let mut remaining = total;
    while !remaining.is_zero() {
        let step = remaining.min(Duration::from_secs(1));
        tokio::time::sleep(step).await;
        remaining -= step;
        if !remaining.is_zero() && remaining.as_secs() % 10 == 0 {
            info!("rate limit wait: {}s remaining", remaining.as_secs());
        }
    }
}
