//! Response normalizer: free-form model text in, stable envelope out.
//!
//! The upstream model gives no schema guarantee, and its output format has
//! drifted across prompt revisions. Replies therefore pass through a closed
//! set of shape decoders ([`ReplyShape`]): the canonical envelope first, then
//! the older bare-array shape, then failure. Callers never learn which shape
//! arrived. Every record URL is validated against the trusted catalog domain
//! on the way out.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::recommend::models::{
    RecommendationRecord, ResponseEnvelope, Support, MAX_RECOMMENDATIONS,
};

/// Hostname every record URL must resolve to (subdomains accepted).
pub const TRUSTED_DOMAIN: &str = "shl.com";

/// Substitute for missing or untrusted record URLs.
pub const DEFAULT_CATALOG_URL: &str = "https://www.shl.com/solutions/products/product-catalog/";

/// First bracket-delimited array of JSON objects: non-greedy, dot matches
/// newline, so it finds a list embedded in surrounding prose.
static LEGACY_ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").expect("legacy array regex"));

/// The older reply shape: a bare JSON array of objects keyed by
/// human-readable capitalized names. `URL` is the one key the model
/// regularly omits, so it alone is optional.
#[derive(Debug, Deserialize)]
pub struct LegacyRecord {
    #[serde(rename = "Assessment Name")]
    pub assessment_name: String,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(rename = "Remote Testing Support")]
    pub remote_testing: Support,
    #[serde(rename = "Adaptive/IRT Support")]
    pub adaptive_support: Support,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Test Type")]
    pub test_type: String,
}

impl From<LegacyRecord> for RecommendationRecord {
    fn from(legacy: LegacyRecord) -> Self {
        Self {
            assessment_name: legacy.assessment_name,
            url: legacy
                .url
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            remote_testing: legacy.remote_testing,
            adaptive_support: legacy.adaptive_support,
            duration: legacy.duration,
            test_type: legacy.test_type,
        }
    }
}

/// The closed set of reply shapes the pipeline accepts. Extending it means
/// adding a variant and a decoder, not another layer of ad hoc parsing.
#[derive(Debug)]
pub enum ReplyShape {
    Canonical(ResponseEnvelope),
    LegacyArray(Vec<LegacyRecord>),
    Unparseable,
}

/// Decides which decoder a raw reply satisfies. Used by the executor to
/// judge acceptability before the full normalization pass.
pub fn classify(raw: &str) -> ReplyShape {
    let text = strip_json_fences(raw);

    if let Ok(envelope) = serde_json::from_str::<ResponseEnvelope>(text) {
        return ReplyShape::Canonical(envelope);
    }

    if let Some(found) = LEGACY_ARRAY_RE.find(text) {
        if let Ok(records) = serde_json::from_str::<Vec<LegacyRecord>>(found.as_str()) {
            return ReplyShape::LegacyArray(records);
        }
    }

    ReplyShape::Unparseable
}

/// Turns raw reply text into a [`ResponseEnvelope`], enforcing the envelope
/// invariants: an error envelope carries no data, `data` never exceeds
/// [`MAX_RECOMMENDATIONS`], and every URL resolves to the trusted domain.
pub fn normalize(raw: &str) -> ResponseEnvelope {
    if raw.trim().is_empty() {
        return ResponseEnvelope::error("empty/invalid response");
    }

    let mut envelope = match classify(raw) {
        ReplyShape::Canonical(envelope) if envelope.is_error() => {
            // Whatever the model attached, an error envelope carries no data.
            return ResponseEnvelope::error(envelope.message);
        }
        ReplyShape::Canonical(envelope) => envelope,
        ReplyShape::LegacyArray(records) => {
            let data: Vec<RecommendationRecord> = records.into_iter().map(Into::into).collect();
            ResponseEnvelope::success(format!("{} recommendations", data.len()), data)
        }
        ReplyShape::Unparseable => {
            return ResponseEnvelope::error("failed to parse response");
        }
    };

    envelope.data.truncate(MAX_RECOMMENDATIONS);
    sanitize_urls(&mut envelope);
    envelope
}

/// Replaces record URLs that do not resolve to the trusted catalog domain.
/// Idempotent: the default catalog URL is itself trusted.
fn sanitize_urls(envelope: &mut ResponseEnvelope) {
    for record in &mut envelope.data {
        if !is_trusted_url(&record.url) {
            record.url = DEFAULT_CATALOG_URL.to_string();
        }
    }
}

fn is_trusted_url(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(host_is_trusted))
        .unwrap_or(false)
}

fn host_is_trusted(host: &str) -> bool {
    host.strip_suffix(TRUSTED_DOMAIN)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('.'))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
