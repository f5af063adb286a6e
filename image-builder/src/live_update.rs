//! Incremental sync rules.
//!
//! A live update copies changed files straight into the running container
//! instead of rebuilding the image. Some files (dependency manifests, lock
//! files) invalidate that shortcut: when one of them changes the
//! orchestrator must abandon the sync and rebuild from scratch. The rules
//! here are declarations only; matching changed files against them is the
//! orchestrator's job.

use crate::{is_inside_context, ImageBuilderError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Copy files under `source` (relative to the build context) to `destination`
/// inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRule {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl SyncRule {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Live-update section of a build declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdate {
    /// Sentinel files that force a full rebuild when changed
    pub fall_back_on: Vec<PathBuf>,
    /// Sync rules, first match wins
    pub sync: Vec<SyncRule>,
}

impl LiveUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fall_back_on(mut self, sentinel: impl Into<PathBuf>) -> Self {
        self.fall_back_on.push(sentinel.into());
        self
    }

    pub fn sync(mut self, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        self.sync.push(SyncRule::new(source, destination));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fall_back_on.is_empty() && self.sync.is_empty()
    }

    pub(crate) fn problems(&self) -> Vec<ImageBuilderError> {
        let mut problems = Vec::new();
        for sentinel in &self.fall_back_on {
            if !is_inside_context(sentinel) {
                problems.push(ImageBuilderError::OutsideContext {
                    path: sentinel.clone(),
                });
            }
        }
        for rule in &self.sync {
            if !is_inside_context(&rule.source) {
                problems.push(ImageBuilderError::OutsideContext {
                    path: rule.source.clone(),
                });
            }
            if !rule.destination.is_absolute() {
                problems.push(ImageBuilderError::RelativeDestination {
                    path: rule.destination.clone(),
                });
            }
        }
        problems
    }
}
