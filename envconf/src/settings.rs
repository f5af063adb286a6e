//! Typed view of the resolved configuration.
//!
//! These are the checks the service itself performs when it starts. Running
//! them before anything is handed to the cluster turns a crash-looping pod
//! into an error at the developer's terminal.

use crate::keys::*;
use crate::resolver::{ResolvedConfig, REDACTED};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid log_level: {0}. Must be one of: CRITICAL, DEBUG, ERROR, INFO, WARNING")]
    InvalidLogLevel(String),

    #[error("{key} must be an integer, got '{value}'")]
    InvalidInteger { key: String, value: String },

    #[error("{key} must be configured")]
    Missing { key: String },

    #[error("Invalid {key}: {value}. Must be a valid http(s) URL.")]
    InvalidUrl { key: String, value: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://").expect("static regex"))
}

/// `http://` or `https://` URL, the only schemes the service and its links use
pub fn is_http_url(value: &str) -> bool {
    url_regex().is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Closest `tracing` level; CRITICAL has no counterpart and maps to ERROR
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(SettingsError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object-store connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub endpoint_url: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub external_url: Option<String>,
    pub region: String,
    /// Presigned URL lifetime in seconds
    pub upload_expiration: u64,
    /// Inferred from the endpoint scheme
    pub use_ssl: bool,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket", &self.bucket)
            .field("access_key", &REDACTED)
            .field("secret_key", &REDACTED)
            .field("external_url", &self.external_url)
            .field("region", &self.region)
            .field("upload_expiration", &self.upload_expiration)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

/// Settings the service validates at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub app_env: String,
    pub cors_allow_urls: Vec<String>,
    pub log_level: LogLevel,
    pub debugpy_enabled: bool,
    pub debugpy_port: u16,
    pub debugpy_wait: bool,
    pub s3: S3Settings,
}

impl AppSettings {
    pub fn from_resolved(config: &ResolvedConfig) -> SettingsResult<Self> {
        let get = |key: &str| config.get(key).unwrap_or_default();

        let endpoint_url = get(S3_ENDPOINT_URL).trim().to_string();
        if endpoint_url.is_empty() {
            return Err(missing(S3_ENDPOINT_URL));
        }
        if !is_http_url(&endpoint_url) {
            return Err(SettingsError::InvalidUrl {
                key: S3_ENDPOINT_URL.to_string(),
                value: endpoint_url,
            });
        }

        let s3 = S3Settings {
            use_ssl: endpoint_url.starts_with("https://"),
            bucket: required(get(S3_BUCKET), S3_BUCKET)?,
            access_key: required(get(S3_ACCESS_KEY), "S3_ACCESS_KEY/MINIO_ROOT_USER")?,
            secret_key: required(get(S3_SECRET_KEY), "S3_SECRET_KEY/MINIO_ROOT_PASSWORD")?,
            external_url: Some(get(S3_EXTERNAL_URL).trim())
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            region: get(S3_REGION).to_string(),
            upload_expiration: integer(get(S3_UPLOAD_EXPIRATION), S3_UPLOAD_EXPIRATION)?,
            endpoint_url,
        };

        Ok(Self {
            app_env: get(APP_ENV).to_string(),
            cors_allow_urls: parse_cors_origins(get(CORS_ALLOW_URLS))?,
            log_level: get(LOG_LEVEL).parse()?,
            debugpy_enabled: flag(get(DEBUGPY_ENABLED)),
            debugpy_port: integer(get(DEBUGPY_PORT), DEBUGPY_PORT)?,
            debugpy_wait: flag(get(DEBUGPY_WAIT)),
            s3,
        })
    }

    pub fn is_development(&self) -> bool {
        is_development(&self.app_env)
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.app_env)
    }
}

pub fn is_development(app_env: &str) -> bool {
    matches!(app_env.to_lowercase().as_str(), "development" | "dev")
}

pub fn is_production(app_env: &str) -> bool {
    matches!(app_env.to_lowercase().as_str(), "production" | "prod")
}

/// Only a case-insensitive "true" enables a flag
pub fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Split a comma-separated origin list, requiring at least one http(s) URL
pub fn parse_cors_origins(value: &str) -> SettingsResult<Vec<String>> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        return Err(missing(CORS_ALLOW_URLS));
    }
    if let Some(bad) = origins.iter().find(|origin| !is_http_url(origin)) {
        return Err(SettingsError::InvalidUrl {
            key: "CORS origin".to_string(),
            value: bad.clone(),
        });
    }
    Ok(origins)
}

fn missing(key: &str) -> SettingsError {
    SettingsError::Missing {
        key: key.to_string(),
    }
}

fn required(value: &str, key: &str) -> SettingsResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(missing(key));
    }
    Ok(value.to_string())
}

fn integer<T: FromStr>(value: &str, key: &str) -> SettingsResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
}
