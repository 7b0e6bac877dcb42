// Prompt constants for the recommendation pipeline.
// The template requests the canonical envelope shape; the normalizer still
// tolerates the older bare-array shape for replies that drift.

use crate::errors::AppError;

/// Recommendation prompt template. Replace `{job_description}` before sending.
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"You are a helpful assistant. Based on the following job description, recommend up to 10 relevant SHL assessments.

JOB DESCRIPTION:
{job_description}

Return a single JSON object with this EXACT schema (no extra fields):
{
  "status": "success",
  "message": "one short informational sentence",
  "data": [
    {
      "assessment_name": "Java Design Patterns (New)",
      "url": "https://www.shl.com/solutions/products/product-catalog/view/java-design-patterns-new/",
      "remote_testing": "Yes",
      "adaptive_support": "No",
      "duration": "30 mins",
      "test_type": "Knowledge & Skills"
    }
  ]
}

Rules:
- "data" holds at most 10 recommendations, ordered most relevant first.
- Every "url" must link to SHL's product catalog.
- "remote_testing" and "adaptive_support" are exactly "Yes" or "No".
- Respond ONLY with the JSON object. No prose, no explanations, no markdown code fences."#;

/// Renders the recommendation prompt for a job description.
///
/// Pure: trims the input, embeds it verbatim, and has no failure mode beyond
/// rejecting an empty description.
pub fn build_recommendation_prompt(job_description: &str) -> Result<String, AppError> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "job description must not be empty".to_string(),
        ));
    }
    Ok(RECOMMENDATION_PROMPT_TEMPLATE.replace("{job_description}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_job_description_verbatim() {
        let jd = "Hiring Java developers who collaborate with business teams.";
        let prompt = build_recommendation_prompt(jd).unwrap();
        assert!(prompt.contains(jd));
    }

    #[test]
    fn test_prompt_trims_surrounding_whitespace() {
        let prompt = build_recommendation_prompt("  senior QA engineer \n").unwrap();
        assert!(prompt.contains("JOB DESCRIPTION:\nsenior QA engineer\n"));
    }

    #[test]
    fn test_empty_job_description_is_rejected() {
        assert!(build_recommendation_prompt("").is_err());
        assert!(build_recommendation_prompt("   \n\t").is_err());
    }

    #[test]
    fn test_prompt_names_all_six_record_fields() {
        let prompt = build_recommendation_prompt("any role").unwrap();
        for key in [
            "assessment_name",
            "url",
            "remote_testing",
            "adaptive_support",
            "duration",
            "test_type",
        ] {
            assert!(prompt.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn test_prompt_caps_list_and_forbids_prose() {
        let prompt = build_recommendation_prompt("any role").unwrap();
        assert!(prompt.contains("at most 10"));
        assert!(prompt.contains("ONLY with the JSON object"));
    }
}
