use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummaryRow};
use crate::resume::models::ParsedResume;
use crate::resume::parser::parse_resume;

pub struct NewResume<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub storage_key: &'a str,
    pub raw_text: &'a str,
    pub parsed: &'a ParsedResume,
}

pub async fn insert_resume(pool: &PgPool, new: &NewResume<'_>) -> Result<ResumeRow> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, filename, content_type, storage_key, raw_text, parsed, parser_version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(new.id)
    .bind(new.user_id)
    .bind(new.filename)
    .bind(new.content_type)
    .bind(new.storage_key)
    .bind(new.raw_text)
    .bind(serde_json::to_value(new.parsed)?)
    .bind(&new.parsed.metadata.parser_version)
    .fetch_one(pool)
    .await?;

    info!("Stored resume {} for user {}", row.id, row.user_id);
    Ok(row)
}

/// The user's resumes, newest first.
pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeSummaryRow>> {
    Ok(sqlx::query_as::<_, ResumeSummaryRow>(
        r#"
        SELECT id, filename, content_type, parser_version, created_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn count_resumes(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resumes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Loads a resume the caller owns: unknown ids are 404, other users' resumes 403.
pub async fn load_owned_resume(
    pool: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
        .bind(resume_id)
        .fetch_optional(pool)
        .await?;
    ensure_owner(row, resume_id, user_id)
}

/// 404 for a missing resume, 403 for someone else's.
pub fn ensure_owner(
    row: Option<ResumeRow>,
    resume_id: Uuid,
    user_id: Uuid,
) -> Result<ResumeRow, AppError> {
    let row = row.ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;
    if row.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(row)
}

/// Decodes the stored parse, re-parsing the raw text when the stored JSON is
/// from an incompatible parser version.
pub fn decode_parsed(row: &ResumeRow) -> Result<ParsedResume, AppError> {
    match serde_json::from_value::<ParsedResume>(row.parsed.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Stored parse of resume {} unreadable ({e}); re-parsing", row.id);
            Ok(parse_resume(&row.raw_text, &row.filename)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;

    fn row(parsed: serde_json::Value) -> ResumeRow {
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "cv.txt".to_string(),
            content_type: "text/plain".to_string(),
            storage_key: "resumes/x/y/cv.txt".to_string(),
            raw_text: "Jane Doe\njane@example.com\n\nSkills\nRust, SQL".to_string(),
            parsed,
            parser_version: "1.0.0".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_owner_statuses() {
        let resume = row(json!({}));
        let (id, owner) = (resume.id, resume.user_id);

        let err = ensure_owner(None, id, owner).unwrap_err();
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);

        let err = ensure_owner(Some(resume.clone()), id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);

        assert_eq!(ensure_owner(Some(resume), id, owner).unwrap().id, id);
    }

    #[test]
    fn test_decode_parsed_round_trips_stored_json() {
        let parsed = parse_resume("Jane Doe\njane@example.com\n\nSkills\nRust, SQL", "cv.txt").unwrap();
        let row = row(serde_json::to_value(&parsed).unwrap());
        assert_eq!(decode_parsed(&row).unwrap(), parsed);
    }

    #[test]
    fn test_decode_parsed_falls_back_to_raw_text() {
        let row = row(json!({"legacy": true}));
        let parsed = decode_parsed(&row).unwrap();
        assert_eq!(parsed.contact.email.as_deref(), Some("jane@example.com"));
        assert!(parsed.skills.iter().any(|s| s == "Rust"));
    }
}
