use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::fit_scoring::FitScorer;
use crate::resume::storage::ResumeStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Session store.
    pub redis: RedisClient,
    /// Original uploaded files, on S3 or local disk.
    pub storage: Arc<dyn ResumeStorage>,
    /// Present only when ANTHROPIC_API_KEY is set.
    pub llm: Option<LlmClient>,
    pub config: Config,
    /// Default: KeywordFitScorer.
    pub fit_scorer: Arc<dyn FitScorer>,
}
