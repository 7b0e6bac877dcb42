//! Canonical data shapes for the recommendation pipeline.
//!
//! Every successful pipeline run produces a `ResponseEnvelope` whose `data`
//! records carry all six catalog fields. Absence of a field is never allowed
//! past the normalizer; empty strings are.

use serde::{Deserialize, Deserializer, Serialize};

/// Hard cap on recommendations per response. The prompt asks the model for at
/// most this many and the normalizer truncates anything beyond it.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Yes/No flag used by the catalog for remote-testing and adaptive support.
///
/// Model output is unreliable about casing ("yes", "YES", " Yes "), so
/// deserialization is lenient: any case-insensitive "yes" maps to `Yes`,
/// everything else to `No`. Serialization is always `"Yes"` / `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Support {
    Yes,
    No,
}

impl<'de> Deserialize<'de> for Support {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("yes") {
            Ok(Support::Yes)
        } else {
            Ok(Support::No)
        }
    }
}

/// One recommended assessment, in the canonical snake_case shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub assessment_name: String,
    /// Must point at the trusted catalog domain; the normalizer replaces
    /// anything else with the default catalog URL.
    pub url: String,
    pub remote_testing: Support,
    pub adaptive_support: Support,
    pub duration: String,
    pub test_type: String,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    #[default]
    Success,
    Error,
}

/// The pipeline's result shape, also the canonical reply shape requested
/// from the model.
///
/// Invariants: `status == Error` implies `data` is empty; `data` never holds
/// more than [`MAX_RECOMMENDATIONS`] records. `message` is informational on
/// success, and a successful envelope may still carry zero records (callers
/// must treat that as "no recommendations").
///
/// On deserialization only `data` is required; `status` and `message` default
/// so a bare `{"data": [...]}` object from the model still counts as
/// canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: String,
    pub data: Vec<RecommendationRecord>,
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>, data: Vec<RecommendationRecord>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
            data: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == EnvelopeStatus::Error
    }
}
