//! Blob storage for original resume uploads.
//!
//! `AppState` carries an `Arc<dyn ResumeStorage>`: S3 (or MinIO) when a bucket
//! is configured, a local directory otherwise.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("Resume file not found".to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Object key for an uploaded resume: `resumes/{user_id}/{resume_id}/{filename}`.
pub fn resume_key(user_id: Uuid, resume_id: Uuid, filename: &str) -> String {
    format!("resumes/{user_id}/{resume_id}/{filename}")
}

#[async_trait]
pub trait ResumeStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Removing a key that does not exist succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// "s3" or "local", for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ResumeStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(format!("download failed: {e}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading body failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local filesystem
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys map to paths under the root; anything that could escape it is rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResumeStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        info!("Stored resume at {}", path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

/// Builds the storage backend the config asks for.
pub async fn build_storage(config: &StorageConfig) -> std::sync::Arc<dyn ResumeStorage> {
    match config {
        StorageConfig::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
            region,
        } => {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "job-assistant-static",
            );

            let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .credentials_provider(credentials)
                .endpoint_url(endpoint)
                .load()
                .await;

            std::sync::Arc::new(S3Storage::new(aws_sdk_s3::Client::new(&s3_config), bucket))
        }
        StorageConfig::Local { upload_dir } => {
            std::sync::Arc::new(LocalStorage::new(upload_dir.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_layout() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            resume_key(user, resume, "cv.pdf"),
            format!("resumes/{user}/{resume}/cv.pdf")
        );
    }

    #[tokio::test]
    async fn test_local_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .put("resumes/u/r/cv.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        let data = storage.get("resumes/u/r/cv.txt").await.unwrap();
        assert_eq!(&data[..], b"hello");
        assert!(dir.path().join("resumes/u/r/cv.txt").exists());
    }

    #[tokio::test]
    async fn test_local_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = storage.get("resumes/nope.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_delete_removes_object_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .put("resumes/u/r/cv.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        storage.delete("resumes/u/r/cv.txt").await.unwrap();
        assert!(!dir.path().join("resumes/u/r/cv.txt").exists());
        storage.delete("resumes/u/r/cv.txt").await.unwrap();
        assert!(matches!(
            storage.delete("../escape").await.unwrap_err(),
            StorageError::InvalidKey(_)
        ));
    }

    #[tokio::test]
    async fn test_local_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        for key in ["../secret", "/etc/passwd", "a/../../b", ""] {
            let err = storage
                .put(key, Bytes::from_static(b"x"), "text/plain")
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn test_build_storage_local() {
        let dir = tempfile::tempdir().unwrap();
        let storage = build_storage(&StorageConfig::Local {
            upload_dir: dir.path().to_path_buf(),
        })
        .await;
        assert_eq!(storage.backend_name(), "local");
    }
}
