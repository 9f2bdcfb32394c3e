use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub storage_key: String,
    #[serde(skip_serializing)]
    pub raw_text: String,
    pub parsed: Value,
    pub parser_version: String,
    pub created_at: DateTime<Utc>,
}

/// Lightweight listing row (no raw text, no parsed payload).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub parser_version: String,
    pub created_at: DateTime<Utc>,
}
