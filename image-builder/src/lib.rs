//! Container image build declarations for the development environment
//!
//! A [`BuildDescriptor`] says *what* to build (image name, context root,
//! dockerfile, build arguments) and *how to keep it fresh* (the
//! [`LiveUpdate`] sync rules). Nothing here runs a build; the descriptor is
//! handed to the external orchestrator which owns execution.

pub mod live_update;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub use live_update::{LiveUpdate, SyncRule};

/// Errors related to build declarations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageBuilderError {
    #[error("Invalid image name '{image}': {reason}")]
    InvalidImage { image: String, reason: String },
    #[error("Invalid build argument '{name}': {reason}")]
    InvalidBuildArg { name: String, reason: String },
    #[error("Path '{path}' must be relative to the build context and stay inside it")]
    OutsideContext { path: PathBuf },
    #[error("Sync destination '{path}' must be an absolute container path")]
    RelativeDestination { path: PathBuf },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ImageBuilderResult<T> = Result<T, ImageBuilderError>;

/// Declaration of a container image build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Image reference the orchestrator tags the result with
    pub image: String,
    /// Build context root
    pub context: PathBuf,
    /// Dockerfile, relative to the context
    pub dockerfile: PathBuf,
    /// Build-time arguments
    pub build_args: BTreeMap<String, String>,
    /// Incremental sync rules
    pub live_update: LiveUpdate,
    /// Globs excluded from the context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

impl BuildDescriptor {
    /// Create a descriptor with the conventional `Dockerfile` and no sync rules
    pub fn new(image: impl Into<String>, context: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            context: context.into(),
            dockerfile: PathBuf::from("Dockerfile"),
            build_args: BTreeMap::new(),
            live_update: LiveUpdate::default(),
            ignore: Vec::new(),
        }
    }

    pub fn with_dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = dockerfile.into();
        self
    }

    pub fn with_build_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.insert(name.into(), value.into());
        self
    }

    pub fn with_live_update(mut self, live_update: LiveUpdate) -> Self {
        self.live_update = live_update;
        self
    }

    pub fn with_ignore(mut self, glob: impl Into<String>) -> Self {
        self.ignore.push(glob.into());
        self
    }

    /// Every problem with the descriptor, in field order
    pub fn problems(&self) -> Vec<ImageBuilderError> {
        let mut problems = Vec::new();

        if let Err(reason) = check_image_reference(&self.image) {
            problems.push(ImageBuilderError::InvalidImage {
                image: self.image.clone(),
                reason,
            });
        }

        if self.dockerfile.as_os_str().is_empty() {
            problems.push(ImageBuilderError::InvalidConfig(
                "dockerfile path is empty".to_string(),
            ));
        } else if !is_inside_context(&self.dockerfile) {
            problems.push(ImageBuilderError::OutsideContext {
                path: self.dockerfile.clone(),
            });
        }

        for name in self.build_args.keys() {
            if name.is_empty() || name.contains('=') || name.contains(char::is_whitespace) {
                problems.push(ImageBuilderError::InvalidBuildArg {
                    name: name.clone(),
                    reason: "names must be non-empty and contain no '=' or whitespace"
                        .to_string(),
                });
            }
        }

        problems.extend(self.live_update.problems());
        problems
    }

    /// Check the descriptor, reporting the first problem found
    pub fn validate(&self) -> ImageBuilderResult<()> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }
}

/// True when `path` is relative and never climbs above its starting directory
pub fn is_inside_context(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return false,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::Normal(_) => depth += 1,
        }
    }
    true
}

fn check_image_reference(image: &str) -> Result<(), String> {
    if image.is_empty() {
        return Err("image name is empty".to_string());
    }
    if image.chars().any(|c| c.is_whitespace()) {
        return Err("image name contains whitespace".to_string());
    }
    let repository = image.split(':').next().unwrap_or_default();
    if repository.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("repository must be lowercase".to_string());
    }
    if !repository
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-/".contains(c))
    {
        return Err("repository may only contain [a-z0-9._-/]".to_string());
    }
    Ok(())
}
