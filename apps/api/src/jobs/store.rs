use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::dedup::{normalize_url, CandidatePosting};
use crate::jobs::jd_parser::{parse_job_description, ParsedJobDescription};
use crate::models::job::JobPostingRow;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
const SIMILAR_POSTINGS_WINDOW: i64 = 200;

pub struct NewJob<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub location: Option<&'a str>,
    pub description: &'a str,
    pub source_platform: &'a str,
    pub url: Option<&'a str>,
    pub parsed: &'a ParsedJobDescription,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub q: Option<String>,
    pub platform: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Escapes `%`, `_` and `\` for use inside a LIKE pattern.
fn like_escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Key the unique index is built on; `None` when there is no usable URL.
pub fn url_key(url: Option<&str>) -> Option<String> {
    url.map(normalize_url).filter(|u| !u.is_empty())
}

/// Postings that could collide with the candidate; the exact rules live in `check_for_duplicates`.
/// The same-URL lookup is exact and uncapped. Title and company matches come from a capped window.
pub async fn find_possible_duplicates(
    pool: &PgPool,
    candidate: &CandidatePosting<'_>,
) -> Result<Vec<JobPostingRow>, AppError> {
    let same_url = match url_key(candidate.url) {
        Some(key) => {
            sqlx::query_as::<_, JobPostingRow>(
                r#"
                SELECT * FROM job_postings
                WHERE normalized_url = $1
                  AND lower(source_platform) = lower($2)
                "#,
            )
            .bind(key)
            .bind(candidate.source_platform)
            .fetch_all(pool)
            .await?
        }
        None => Vec::new(),
    };

    let similar = sqlx::query_as::<_, JobPostingRow>(
        r#"
        SELECT * FROM job_postings
        WHERE lower(title) = lower($1)
           OR lower(company) = lower($2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(candidate.title.trim())
    .bind(candidate.company.trim())
    .bind(SIMILAR_POSTINGS_WINDOW)
    .fetch_all(pool)
    .await?;

    Ok(merge_candidates(same_url, similar))
}

/// Same-URL rows first, then the rest without repeats.
fn merge_candidates(
    same_url: Vec<JobPostingRow>,
    similar: Vec<JobPostingRow>,
) -> Vec<JobPostingRow> {
    let mut seen: HashSet<Uuid> = same_url.iter().map(|job| job.id).collect();
    let mut merged = same_url;
    merged.extend(similar.into_iter().filter(|job| seen.insert(job.id)));
    merged
}

pub async fn insert_job(pool: &PgPool, new: &NewJob<'_>) -> Result<JobPostingRow, AppError> {
    let parsed = serde_json::to_value(new.parsed).map_err(|e| AppError::Internal(e.into()))?;

    let result = sqlx::query_as::<_, JobPostingRow>(
        r#"
        INSERT INTO job_postings
            (id, title, company, location, description, source_platform, url, normalized_url,
             parsed, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.title)
    .bind(new.company)
    .bind(new.location)
    .bind(new.description)
    .bind(new.source_platform)
    .bind(new.url)
    .bind(url_key(new.url))
    .bind(parsed)
    .bind(new.created_by)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => {
            info!(
                "Ingested job posting {} ({} keywords) from {}",
                row.id,
                new.parsed.keyword_inventory.len(),
                row.source_platform
            );
            Ok(row)
        }
        // Lost a race against another ingest of the same URL.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(
            "A posting with this URL was already ingested from this platform".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Case-insensitive substring search over title, company and description, newest first.
pub async fn search_jobs(pool: &PgPool, filter: &JobFilter) -> Result<Vec<JobPostingRow>, AppError> {
    let pattern = filter
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", like_escape(q)));
    let platform = filter
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    Ok(sqlx::query_as::<_, JobPostingRow>(
        r#"
        SELECT * FROM job_postings
        WHERE ($1::text IS NULL
               OR title ILIKE $1
               OR company ILIKE $1
               OR description ILIKE $1)
          AND ($2::text IS NULL OR lower(source_platform) = lower($2))
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(pattern)
    .bind(platform)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?)
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<JobPostingRow, AppError> {
    sqlx::query_as::<_, JobPostingRow>("SELECT * FROM job_postings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job posting {id} not found")))
}

/// The most recent postings, used as the recommendation pool.
pub async fn recent_jobs(pool: &PgPool, limit: i64) -> Result<Vec<JobPostingRow>, AppError> {
    Ok(sqlx::query_as::<_, JobPostingRow>(
        "SELECT * FROM job_postings ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// The stored parse, or a fresh parse of the description when the stored JSON is unreadable.
pub fn parsed_job(job: &JobPostingRow) -> ParsedJobDescription {
    serde_json::from_value(job.parsed.clone()).unwrap_or_else(|e| {
        warn!("Stored parse of job {} unreadable ({e}); re-parsing", job.id);
        parse_job_description(&job.title, &job.description)
    })
}

pub fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::dedup::{check_for_duplicates, DuplicateSeverity};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(None, None), (20, 0));
        assert_eq!(clamp_page(Some(0), Some(-5)), (1, 0));
        assert_eq!(clamp_page(Some(1000), Some(40)), (100, 40));
    }

    #[test]
    fn test_like_escape() {
        assert_eq!(like_escape("100%_c\\d"), "100\\%\\_c\\\\d");
    }

    fn job(title: &str, company: &str, url: Option<&str>) -> JobPostingRow {
        JobPostingRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: company.to_string(),
            location: None,
            description: "Requirements: Rust and PostgreSQL".to_string(),
            source_platform: "manual".to_string(),
            url: url.map(str::to_string),
            parsed: json!({"old": "format"}),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_url_key_matches_duplicate_rules() {
        assert_eq!(
            url_key(Some(" HTTPS://Jobs.example.com/123/?utm=feed#apply ")).as_deref(),
            Some("https://jobs.example.com/123")
        );
        assert_eq!(url_key(Some("/?ref=x")), None);
        assert_eq!(url_key(None), None);
    }

    #[test]
    fn test_old_same_url_posting_survives_full_window() {
        let old = job("Backend Engineer", "Acme", Some("https://jobs.example.com/1"));
        let similar: Vec<JobPostingRow> = (0..SIMILAR_POSTINGS_WINDOW)
            .map(|i| job(&format!("Role {i}"), "Acme", None))
            .collect();

        let merged = merge_candidates(vec![old.clone()], similar);
        assert_eq!(merged.len(), SIMILAR_POSTINGS_WINDOW as usize + 1);
        assert_eq!(merged[0].id, old.id);

        let warnings = check_for_duplicates(
            &merged,
            &CandidatePosting {
                title: "Platform Engineer",
                company: "Acme",
                source_platform: "MANUAL",
                url: Some("https://jobs.example.com/1/"),
            },
        );
        assert!(warnings
            .iter()
            .any(|w| w.existing_job_id == old.id && w.severity == DuplicateSeverity::Blocking));
    }

    #[test]
    fn test_merge_candidates_drops_repeats() {
        let a = job("Backend Engineer", "Acme", Some("https://x.io/1"));
        let b = job("Backend Engineer", "Acme", None);
        let merged = merge_candidates(vec![a.clone()], vec![b.clone(), a.clone()]);
        let ids: Vec<Uuid> = merged.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_parsed_job_reparses_unreadable_json() {
        let parsed = parsed_job(&job("Rust Engineer", "Acme", None));
        assert!(parsed.keyword_inventory.iter().any(|k| k.keyword == "PostgreSQL"));
        assert_eq!(parsed.keyword_inventory[0].keyword, "Rust");
    }
}
