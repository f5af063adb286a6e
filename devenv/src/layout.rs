//! Static project layout: workload names, ports, build context and chart
//! location. Built-in defaults describe the octowalrus repository; a
//! `devenv.toml` can override any of them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LAYOUT_FILE: &str = "devenv.toml";

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to read layout file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse layout file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub service: ServiceLayout,
    pub object_store: ObjectStoreLayout,
    pub chart: ChartLayout,
}

/// The API workload and its image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceLayout {
    pub name: String,
    pub image: String,
    pub context: PathBuf,
    pub dockerfile: PathBuf,
    pub container_port: u16,
    pub local_port: u16,
    pub sync: Vec<SyncEntry>,
    pub fall_back_on: Vec<PathBuf>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Default for ServiceLayout {
    fn default() -> Self {
        Self {
            name: "octowalrus".to_string(),
            image: "octowalrus".to_string(),
            context: PathBuf::from("."),
            dockerfile: PathBuf::from("Dockerfile"),
            container_port: 8000,
            local_port: 8000,
            sync: vec![SyncEntry {
                source: PathBuf::from("./src"),
                destination: PathBuf::from("/app/src"),
            }],
            fall_back_on: vec![PathBuf::from("pyproject.toml"), PathBuf::from("uv.lock")],
            ignore: vec![
                ".venv".to_string(),
                "**/__pycache__".to_string(),
                "chart".to_string(),
            ],
        }
    }
}

/// S3-compatible object store the service depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectStoreLayout {
    pub name: String,
    pub api_port: u16,
    pub local_api_port: u16,
    pub console_port: u16,
    pub local_console_port: u16,
}

impl Default for ObjectStoreLayout {
    fn default() -> Self {
        Self {
            name: "octowalrus-minio".to_string(),
            api_port: 9000,
            local_api_port: 19000,
            console_port: 9001,
            local_console_port: 19001,
        }
    }
}

/// Where the chart lives and how it is released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartLayout {
    pub path: PathBuf,
    pub release: String,
    pub namespace: String,
    /// Defaults to `<path>/values-<APP_ENV>.yaml`
    pub values_file: Option<PathBuf>,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chart"),
            release: "octowalrus".to_string(),
            namespace: "default".to_string(),
            values_file: None,
        }
    }
}

impl ChartLayout {
    pub fn values_file_for(&self, environment: &str) -> PathBuf {
        self.values_file
            .clone()
            .unwrap_or_else(|| self.path.join(format!("values-{}.yaml", environment)))
    }
}

impl Layout {
    pub fn from_toml(contents: &str, path: &Path) -> LayoutResult<Self> {
        toml::from_str(contents).map_err(|source| LayoutError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> LayoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = Self::from_toml(&contents, path)?;
        debug!(path = %path.display(), "loaded layout");
        Ok(layout)
    }

    /// Load `explicit` if given, else `devenv.toml` in `dir` if present, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> LayoutResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_LAYOUT_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!("no layout file, using built-in layout");
            Ok(Self::default())
        }
    }
}
