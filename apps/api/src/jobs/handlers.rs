use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::dedup::{check_for_duplicates, CandidatePosting, DuplicateSeverity, DuplicateWarning};
use crate::jobs::jd_parser::{parse_job_description, ParsedJobDescription};
use crate::jobs::store::{
    clamp_page, find_possible_duplicates, get_job, insert_job, search_jobs, JobFilter, NewJob,
};
use crate::models::job::JobPostingRow;
use crate::state::AppState;

const DEFAULT_PLATFORM: &str = "manual";

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub source_platform: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job: JobPostingRow,
    pub duplicate_warnings: Vec<DuplicateWarning>,
}

#[derive(Debug, Deserialize)]
pub struct JobSearchQuery {
    pub q: Option<String>,
    pub platform: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobPostingRow>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    #[serde(default)]
    pub title: String,
    pub description: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A blocking duplicate rejects the ingest with 409. Advisory ones are returned with the new posting.
fn reject_blocking_duplicates(warnings: &[DuplicateWarning]) -> Result<(), AppError> {
    match warnings
        .iter()
        .find(|w| w.severity == DuplicateSeverity::Blocking)
    {
        Some(blocking) => Err(AppError::Conflict(blocking.description.clone())),
        None => Ok(()),
    }
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let title = req.title.trim();
    let description = req.description.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if description.is_empty() {
        return Err(AppError::Validation("description must not be empty".to_string()));
    }

    let candidate = CandidatePosting {
        title,
        company: req.company.trim(),
        source_platform: non_blank(req.source_platform.as_deref()).unwrap_or(DEFAULT_PLATFORM),
        url: non_blank(req.url.as_deref()),
    };

    let existing = find_possible_duplicates(&state.db, &candidate).await?;
    let duplicate_warnings = check_for_duplicates(&existing, &candidate);
    reject_blocking_duplicates(&duplicate_warnings)?;

    let parsed = parse_job_description(title, description);
    let job = insert_job(
        &state.db,
        &NewJob {
            title,
            company: candidate.company,
            location: non_blank(req.location.as_deref()),
            description,
            source_platform: candidate.source_platform,
            url: candidate.url,
            parsed: &parsed,
            created_by: Some(auth.user_id),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job,
            duplicate_warnings,
        }),
    ))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<JobSearchQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let (limit, offset) = clamp_page(params.limit, params.offset);
    let jobs = search_jobs(
        &state.db,
        &JobFilter {
            q: params.q,
            platform: params.platform,
            limit,
            offset,
        },
    )
    .await?;
    Ok(Json(JobListResponse { jobs, limit, offset }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobPostingRow>, AppError> {
    Ok(Json(get_job(&state.db, id).await?))
}

/// POST /api/v1/jobs/parse
/// Preview of what ingest would extract; nothing is stored.
pub async fn handle_parse_job(
    Json(req): Json<ParseJobRequest>,
) -> Result<Json<ParsedJobDescription>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("description must not be empty".to_string()));
    }
    Ok(Json(parse_job_description(req.title.trim(), &req.description)))
}
