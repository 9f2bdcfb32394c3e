use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_RECOMMENDATION_POOL: i64 = 500;

/// Where uploaded resume files end up.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// S3 or any S3-compatible endpoint (MinIO locally).
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
        region: String,
    },
    /// Plain directory on the server's filesystem.
    Local { upload_dir: PathBuf },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub storage: StorageConfig,
    /// Enables LLM bullet rewrites in the optimizer when present.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_secs: u64,
    pub max_upload_bytes: usize,
    pub recommendation_pool: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let storage = match lookup("S3_BUCKET").filter(|v| !v.trim().is_empty()) {
            Some(bucket) => StorageConfig::S3 {
                bucket,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            },
            None => StorageConfig::Local {
                upload_dir: PathBuf::from(
                    lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
                ),
            },
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            storage,
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|v| !v.trim().is_empty()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            recommendation_pool: parse_or(
                &lookup,
                "RECOMMENDATION_POOL",
                DEFAULT_RECOMMENDATION_POOL,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
