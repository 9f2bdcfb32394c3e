use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::store::{get_job, parsed_job, recent_jobs};
use crate::matching::fit_scoring::{CandidateProfile, FitReport};
use crate::matching::recommend::{rank_jobs, RankedJob};
use crate::resume::store::{decode_parsed, load_owned_resume};
use crate::state::AppState;

const DEFAULT_RECOMMENDATIONS: i64 = 10;
const MAX_RECOMMENDATIONS: i64 = 50;

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub resume_id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub report: FitReport,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub resume_id: Uuid,
    pub considered: usize,
    pub recommendations: Vec<RankedJob>,
}

/// GET /api/v1/resumes/:id/matches/:job_id
pub async fn handle_match(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((resume_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchResponse>, AppError> {
    let resume = load_owned_resume(&state.db, resume_id, auth.user_id).await?;
    let job = get_job(&state.db, job_id).await?;

    let profile = CandidateProfile::from_resume(&decode_parsed(&resume)?, &resume.raw_text);
    let report = state.fit_scorer.score(&profile, &parsed_job(&job)).await?;

    info!(
        "Resume {resume_id} vs job {job_id}: {}/100 ({} gaps)",
        report.overall_score,
        report.gaps.len()
    );

    Ok(Json(MatchResponse {
        resume_id,
        job_id,
        job_title: job.title,
        company: job.company,
        report,
    }))
}

/// GET /api/v1/resumes/:id/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS);

    let resume = load_owned_resume(&state.db, resume_id, auth.user_id).await?;
    let profile = CandidateProfile::from_resume(&decode_parsed(&resume)?, &resume.raw_text);

    let pool = recent_jobs(&state.db, state.config.recommendation_pool).await?;
    let recommendations = rank_jobs(
        state.fit_scorer.as_ref(),
        &profile,
        &pool,
        Utc::now(),
        limit as usize,
    )
    .await?;

    Ok(Json(RecommendationResponse {
        resume_id,
        considered: pool.len(),
        recommendations,
    }))
}
