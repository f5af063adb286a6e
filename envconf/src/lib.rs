pub mod keys;
pub mod local;
pub mod resolver;
pub mod settings;
pub mod snapshot;

pub use keys::{octowalrus_keys, CONFIG_KEYS, SECRET_KEYS};
pub use local::safe_local;
pub use resolver::{
    resolve, KeySpec, Presence, ResolvedConfig, ResolvedValue, Resolver, ValueSource, REDACTED,
};
pub use settings::{
    is_http_url, AppSettings, LogLevel, S3Settings, SettingsError, SettingsResult,
};
pub use snapshot::{EnvironmentSnapshot, SnapshotError};

pub mod prelude {
    pub use crate::keys::*;
    pub use crate::local::*;
    pub use crate::resolver::*;
    pub use crate::settings::*;
    pub use crate::snapshot::*;
}
