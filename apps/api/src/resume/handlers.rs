use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummaryRow};
use crate::resume::completeness::{compute_completeness_report, CompletenessReport};
use crate::resume::extract::{detect_format, extract_text, secure_filename, DocumentFormat};
use crate::resume::models::ParsedResume;
use crate::resume::parser::parse_resume;
use crate::resume::storage::{resume_key, ResumeStorage};
use crate::resume::store::{decode_parsed, insert_resume, list_resumes, load_owned_resume, NewResume};
use crate::state::AppState;

/// Multipart field the upload form uses.
const FILE_FIELD: &str = "resume";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub parsed: ParsedResume,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub resume: ResumeRow,
    pub completeness: CompletenessReport,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().trim().to_string();
        if filename.is_empty() {
            return Err(AppError::Validation("No selected file".to_string()));
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("No file part".to_string()))
}

struct PreparedUpload {
    filename: String,
    format: DocumentFormat,
    raw_text: String,
    parsed: ParsedResume,
    bytes: Bytes,
}

/// Validates and parses an upload. Nothing is stored yet, so unreadable
/// documents leave nothing behind.
async fn prepare_upload(upload: UploadedFile) -> Result<PreparedUpload, AppError> {
    let filename = secure_filename(&upload.filename);
    let format = detect_format(&filename, upload.content_type.as_deref())?;
    let raw_text = extract_text(upload.bytes.to_vec(), format).await?;
    let parsed = parse_resume(&raw_text, &filename)?;
    Ok(PreparedUpload {
        filename,
        format,
        raw_text,
        parsed,
        bytes: upload.bytes,
    })
}

/// Writes the original file, then the row. If the row cannot be written the
/// object is removed again.
async fn store_then_insert<T>(
    storage: &dyn ResumeStorage,
    key: &str,
    bytes: Bytes,
    content_type: &str,
    insert: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, AppError> {
    storage.put(key, bytes, content_type).await?;
    match insert.await {
        Ok(row) => Ok(row),
        Err(e) => {
            if let Err(cleanup) = storage.delete(key).await {
                warn!("Could not remove {key} after failed insert: {cleanup}");
            }
            Err(e.into())
        }
    }
}

/// POST /api/v1/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let upload = prepare_upload(read_upload(multipart).await?).await?;
    let content_type = upload.format.content_type();

    let resume_id = Uuid::new_v4();
    let storage_key = resume_key(auth.user_id, resume_id, &upload.filename);
    let row = store_then_insert(
        state.storage.as_ref(),
        &storage_key,
        upload.bytes,
        content_type,
        insert_resume(
            &state.db,
            &NewResume {
                id: resume_id,
                user_id: auth.user_id,
                filename: &upload.filename,
                content_type,
                storage_key: &storage_key,
                raw_text: &upload.raw_text,
                parsed: &upload.parsed,
            },
        ),
    )
    .await?;

    let parsed = upload.parsed;
    info!(
        "Parsed resume {} ({} skills, {} roles) via {} storage",
        row.id,
        parsed.skills.len(),
        parsed.experience.len(),
        state.storage.backend_name()
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: row.id,
            filename: row.filename,
            content_type: row.content_type,
            parsed,
            created_at: row.created_at,
        }),
    ))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    Ok(Json(list_resumes(&state.db, auth.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let row = load_owned_resume(&state.db, id, auth.user_id).await?;
    let parsed = decode_parsed(&row)?;
    let completeness = compute_completeness_report(&parsed);
    Ok(Json(ResumeDetailResponse {
        resume: row,
        completeness,
    }))
}

/// GET /api/v1/resumes/:id/file
pub async fn handle_download_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = load_owned_resume(&state.db, id, auth.user_id).await?;
    let bytes = state.storage.get(&row.storage_key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, row.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", row.filename),
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    use crate::resume::storage::LocalStorage;

    const BOUNDARY: &str = "XBOUNDARYX";

    async fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Multipart {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: text/plain\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn upload(filename: &str, content: &'static [u8]) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content_type: None,
            bytes: Bytes::from_static(content),
        }
    }

    fn message(err: AppError) -> (StatusCode, String) {
        let status = err.status_and_code().0;
        (status, err.to_string())
    }

    #[tokio::test]
    async fn test_read_upload_without_resume_field() {
        let form = multipart(&[("notes", None, "hello")]).await;
        let Err(err) = read_upload(form).await else {
            panic!("expected an error");
        };
        let (status, text) = message(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("No file part"));
    }

    #[tokio::test]
    async fn test_read_upload_with_empty_filename() {
        let form = multipart(&[("resume", Some(""), "")]).await;
        let Err(err) = read_upload(form).await else {
            panic!("expected an error");
        };
        let (status, text) = message(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("No selected file"));
    }

    #[tokio::test]
    async fn test_read_upload_returns_file() {
        let form = multipart(&[("notes", None, "x"), ("resume", Some("cv.txt"), "Jane Doe")]).await;
        let Ok(file) = read_upload(form).await else {
            panic!("expected a file");
        };
        assert_eq!(file.filename, "cv.txt");
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(&file.bytes[..], b"Jane Doe");
    }

    #[tokio::test]
    async fn test_prepare_upload_rejects_unsupported_type() {
        let Err(err) = prepare_upload(upload("cv.docx", b"PK\x03\x04")).await else {
            panic!("expected an error");
        };
        assert_eq!(message(err).0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_prepare_upload_rejects_blank_text() {
        let Err(err) = prepare_upload(upload("cv.txt", b"  \n\0\n ")).await else {
            panic!("expected an error");
        };
        assert_eq!(message(err).0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_prepare_upload_parses_text() {
        let Ok(prepared) = prepare_upload(upload("../My CV.txt", b"Jane Doe\njane@example.com")).await
        else {
            panic!("expected a parsed upload");
        };
        assert_eq!(prepared.filename, "My_CV.txt");
        assert_eq!(prepared.format, DocumentFormat::PlainText);
        assert_eq!(prepared.parsed.contact.email.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = "resumes/u/r/cv.txt";

        let result: Result<(), AppError> = store_then_insert(
            &storage,
            key,
            Bytes::from_static(b"Jane"),
            "text/plain",
            async { Err(anyhow::anyhow!("insert failed")) },
        )
        .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(!dir.path().join(key).exists());
    }

    #[tokio::test]
    async fn test_successful_insert_keeps_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = "resumes/u/r/cv.txt";

        let id = store_then_insert(&storage, key, Bytes::from_static(b"Jane"), "text/plain", async {
            Ok(7)
        })
        .await
        .unwrap();
        assert_eq!(id, 7);
        assert!(dir.path().join(key).exists());
    }
}
