//! Keys understood by the octowalrus service and how each one resolves.

use crate::resolver::KeySpec;

pub const APP_ENV: &str = "APP_ENV";
pub const CORS_ALLOW_URLS: &str = "CORS_ALLOW_URLS";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const DEBUGPY_ENABLED: &str = "DEBUGPY_ENABLED";
pub const DEBUGPY_PORT: &str = "DEBUGPY_PORT";
pub const DEBUGPY_WAIT: &str = "DEBUGPY_WAIT";
pub const S3_ENDPOINT_URL: &str = "S3_ENDPOINT_URL";
pub const S3_BUCKET: &str = "S3_BUCKET";
pub const S3_EXTERNAL_URL: &str = "S3_EXTERNAL_URL";
pub const S3_REGION: &str = "S3_REGION";
pub const S3_UPLOAD_EXPIRATION: &str = "S3_UPLOAD_EXPIRATION";
pub const S3_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const S3_SECRET_KEY: &str = "S3_SECRET_KEY";

/// Legacy object-store credential names, still honoured as fallbacks
pub const MINIO_ROOT_USER: &str = "MINIO_ROOT_USER";
pub const MINIO_ROOT_PASSWORD: &str = "MINIO_ROOT_PASSWORD";

/// Non-secret runtime settings, in the order they appear in the config object
pub const CONFIG_KEYS: &[KeySpec] = &[
    KeySpec::config(APP_ENV, "development"),
    KeySpec::config(CORS_ALLOW_URLS, "http://localhost:3000,http://localhost:8000"),
    KeySpec::config(LOG_LEVEL, "INFO"),
    KeySpec::config(DEBUGPY_ENABLED, "false"),
    KeySpec::config(DEBUGPY_PORT, "5678"),
    KeySpec::config(DEBUGPY_WAIT, "false"),
    KeySpec::config(S3_ENDPOINT_URL, "http://octowalrus-minio:9000"),
    KeySpec::config(S3_BUCKET, "octowalrus"),
    KeySpec::config(S3_EXTERNAL_URL, "http://localhost:19000"),
    KeySpec::config(S3_REGION, "us-east-1"),
    KeySpec::config(S3_UPLOAD_EXPIRATION, "3600"),
];

pub const SECRET_KEYS: &[KeySpec] = &[
    KeySpec::secret(S3_ACCESS_KEY, &[MINIO_ROOT_USER], "admin"),
    KeySpec::secret(S3_SECRET_KEY, &[MINIO_ROOT_PASSWORD], "password"),
];

/// Full resolution table: config keys followed by secrets
pub fn octowalrus_keys() -> Vec<KeySpec> {
    CONFIG_KEYS.iter().chain(SECRET_KEYS).copied().collect()
}
