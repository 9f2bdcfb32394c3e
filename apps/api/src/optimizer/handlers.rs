use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::store::{get_job, parsed_job};
use crate::matching::fit_scoring::CandidateProfile;
use crate::optimizer::report::{optimize, OptimizationReport};
use crate::optimizer::rewrite::rewrite_bullets;
use crate::resume::store::{decode_parsed, load_owned_resume};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OptimizeQuery {
    #[serde(default)]
    pub rewrite: bool,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub resume_id: Uuid,
    pub job_id: Uuid,
    pub report: OptimizationReport,
}

/// GET /api/v1/resumes/:id/optimize/:job_id?rewrite=bool
pub async fn handle_optimize(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((resume_id, job_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<OptimizeQuery>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let llm = match (params.rewrite, state.llm.as_ref()) {
        (true, None) => {
            return Err(AppError::ServiceUnavailable(
                "Bullet rewrites are not available: no LLM API key is configured".to_string(),
            ))
        }
        (true, Some(llm)) => Some(llm),
        (false, _) => None,
    };

    let resume = load_owned_resume(&state.db, resume_id, auth.user_id).await?;
    let job = get_job(&state.db, job_id).await?;

    let parsed_resume = decode_parsed(&resume)?;
    let parsed_jd = parsed_job(&job);
    let profile = CandidateProfile::from_resume(&parsed_resume, &resume.raw_text);
    let fit = state.fit_scorer.score(&profile, &parsed_jd).await?;

    let mut report = optimize(&parsed_resume, &parsed_jd, &fit);

    if let Some(llm) = llm {
        let rewrites = rewrite_bullets(
            llm,
            &report.weak_bullets(),
            &report.missing_keyword_names(),
            report.tone,
        )
        .await?;
        report.rewrites = Some(rewrites);
    }

    info!(
        "Optimized resume {resume_id} for job {job_id}: {} missing keywords, {} section suggestions",
        report.missing_keywords.len(),
        report.section_suggestions.len()
    );

    Ok(Json(OptimizeResponse {
        resume_id,
        job_id,
        report,
    }))
}
