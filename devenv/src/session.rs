//! One run of the pipeline: snapshot, resolve, assemble, validate.

use crate::assembler::assemble;
use crate::declaration::Plan;
use crate::layout::Layout;
use crate::validate::{validate, ValidationError};
use envconf::{
    octowalrus_keys, safe_local, AppSettings, EnvironmentSnapshot, KeySpec, ResolvedConfig,
    Resolver, SettingsResult,
};
use tracing::debug;

/// Build revision override; otherwise taken from git
pub const GIT_SHA: &str = "GIT_SHA";
const GIT_SHA_COMMAND: &str = "git rev-parse --short HEAD";
const GIT_SHA_FALLBACK: &str = "dev";

pub struct Session {
    snapshot: EnvironmentSnapshot,
    keys: Vec<KeySpec>,
    config: ResolvedConfig,
    layout: Layout,
    git_sha: String,
}

impl Session {
    /// Resolve every known key and the build revision from `snapshot`
    pub fn new(snapshot: EnvironmentSnapshot, layout: Layout) -> Self {
        let keys = octowalrus_keys();
        let resolver = Resolver::new(&snapshot, &keys);
        let config = resolver.resolve_all();
        let git_sha = if snapshot.contains(GIT_SHA) {
            resolver.resolve(GIT_SHA, GIT_SHA_FALLBACK)
        } else {
            safe_local(GIT_SHA_COMMAND, GIT_SHA_FALLBACK)
        };
        debug!(keys = config.len(), git_sha = %git_sha, "resolved configuration");

        Self {
            snapshot,
            keys,
            config,
            layout,
            git_sha,
        }
    }

    pub fn snapshot(&self) -> &EnvironmentSnapshot {
        &self.snapshot
    }

    pub fn keys(&self) -> &[KeySpec] {
        &self.keys
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn git_sha(&self) -> &str {
        &self.git_sha
    }

    pub fn settings(&self) -> SettingsResult<AppSettings> {
        AppSettings::from_resolved(&self.config)
    }

    pub fn plan(&self) -> Plan {
        assemble(&self.config, &self.layout, &self.git_sha)
    }

    pub fn validated_plan(&self) -> Result<Plan, ValidationError> {
        let plan = self.plan();
        validate(&plan)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_sha_from_environment() {
        let snapshot = EnvironmentSnapshot::from_pairs([(GIT_SHA, "feedbee")]);
        let session = Session::new(snapshot, Layout::default());
        assert_eq!(session.git_sha(), "feedbee");
        assert_eq!(
            session.plan().builds().next().unwrap().build_args["GIT_SHA"],
            "feedbee"
        );
    }

    #[test]
    fn test_git_sha_is_never_empty_without_override() {
        let session = Session::new(EnvironmentSnapshot::default(), Layout::default());
        assert!(!session.git_sha().is_empty());
    }

    #[test]
    fn test_default_session_plan_validates() {
        let snapshot = EnvironmentSnapshot::from_pairs([(GIT_SHA, "dev")]);
        let session = Session::new(snapshot, Layout::default());
        assert!(session.validated_plan().is_ok());
        assert!(session.settings().is_ok());
        assert_eq!(session.keys().len(), 13);
    }
}
