use anyhow::{bail, Context, Result};

use crate::editor::history::DEFAULT_MAX_HISTORY;

/// Object storage used to publish exported versions.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent → in-memory persistence.
    pub redis_url: Option<String>,
    /// Absent → publishing exports is disabled.
    pub s3: Option<S3Config>,
    pub max_history: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_history = optional_env("MAX_HISTORY")
            .map(|v| {
                v.parse::<usize>()
                    .context("MAX_HISTORY must be a positive integer")
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_HISTORY);
        if max_history == 0 {
            bail!("MAX_HISTORY must be at least 1");
        }

        Ok(Config {
            redis_url: optional_env("REDIS_URL"),
            s3: s3_from_env()?,
            max_history,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// The S3 block is all-or-nothing: `S3_BUCKET` switches it on and then the
/// remaining variables are required.
fn s3_from_env() -> Result<Option<S3Config>> {
    let Some(bucket) = optional_env("S3_BUCKET") else {
        return Ok(None);
    };
    Ok(Some(S3Config {
        bucket,
        endpoint: require_env("S3_ENDPOINT")?,
        access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
        secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
    }))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
