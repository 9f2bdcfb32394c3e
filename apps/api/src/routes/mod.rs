pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{auth, jobs, matching, optimizer, resume};

pub fn build_router(state: AppState) -> Router {
    // multipart framing on top of the file itself
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts and sessions
        .route("/api/v1/auth/signup", post(auth::handlers::handle_signup))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        .route("/api/v1/session", get(auth::handlers::handle_session))
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resume::handlers::handle_list_resumes).post(resume::handlers::handle_upload_resume),
        )
        .route("/api/v1/resumes/:id", get(resume::handlers::handle_get_resume))
        .route(
            "/api/v1/resumes/:id/file",
            get(resume::handlers::handle_download_resume),
        )
        // Matching and optimization
        .route(
            "/api/v1/resumes/:id/matches/:job_id",
            get(matching::handlers::handle_match),
        )
        .route(
            "/api/v1/resumes/:id/recommendations",
            get(matching::handlers::handle_recommendations),
        )
        .route(
            "/api/v1/resumes/:id/optimize/:job_id",
            get(optimizer::handlers::handle_optimize),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handlers::handle_list_jobs).post(jobs::handlers::handle_create_job),
        )
        .route("/api/v1/jobs/parse", post(jobs::handlers::handle_parse_job))
        .route("/api/v1/jobs/:id", get(jobs::handlers::handle_get_job))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
