use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{spawn_hash_password, spawn_verify_password};
use crate::auth::session::{create_session, delete_session, AuthUser, SessionData};
use crate::errors::AppError;
use crate::models::user::{UserRow, UserView};
use crate::resume::store::count_resumes;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub expires_in_secs: u64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    UploadResume,
    BrowseJobs,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub resume_count: i64,
    pub next_step: NextStep,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Requires an `@` with a dot somewhere after it, and a minimum password length.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid_email {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn next_step(resume_count: i64) -> NextStep {
    if resume_count > 0 {
        NextStep::BrowseJobs
    } else {
        NextStep::UploadResume
    }
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = normalize_email(&req.email);
    validate_credentials(&email, &req.password)?;

    let password_hash = spawn_hash_password(req.password).await?;

    let inserted: Option<UserRow> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .fetch_optional(&state.db)
    .await?;

    let user = UserView::from(
        inserted.ok_or_else(|| AppError::Conflict("Email already registered".to_string()))?,
    );
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&req.email);
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(invalid)?;

    let valid = spawn_verify_password(req.password, user.password_hash.clone())
        .await?
        .unwrap_or_else(|e| {
            warn!("Stored password hash for user {} is unreadable: {e}", user.id);
            false
        });
    if !valid {
        return Err(invalid());
    }

    let ttl = state.config.session_ttl_secs;
    let token = create_session(
        &state.redis,
        &SessionData {
            user_id: user.id,
            email: user.email,
        },
        ttl,
    )
    .await?;
    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        expires_in_secs: ttl,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    delete_session(&state.redis, &auth.token).await?;
    info!("User {} logged out", auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/session
pub async fn handle_session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let resume_count = count_resumes(&state.db, auth.user_id).await?;
    Ok(Json(SessionResponse {
        user_id: auth.user_id,
        email: auth.email,
        resume_count,
        next_step: next_step(resume_count),
    }))
}
