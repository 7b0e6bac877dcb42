// Recommendation pipeline: prompt build, rate limiting, retrying executor,
// response normalization. Data flows Builder -> Limiter -> Executor ->
// Normalizer -> caller. All model calls go through llm_client.

pub mod backoff;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod rate_limit;
