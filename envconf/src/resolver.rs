//! Layered value resolution.
//!
//! Each configuration key is described by a [`KeySpec`]: the key itself, an
//! ordered list of alternate keys, a literal default, and a [`Presence`] rule
//! deciding what counts as "set". Resolution walks the chain first match
//! wins and always produces a value.

use crate::keys::octowalrus_keys;
use crate::snapshot::EnvironmentSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// What makes an environment entry win over the rest of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Any set value wins, the empty string included
    SetWins,
    /// Set but empty entries fall through to the next candidate
    NonEmptyWins,
}

impl Presence {
    fn accepts(self, value: &str) -> bool {
        match self {
            Presence::SetWins => true,
            Presence::NonEmptyWins => !value.is_empty(),
        }
    }
}

/// Resolution rule for one configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub key: &'static str,
    /// Checked in order when `key` itself does not win
    pub alternates: &'static [&'static str],
    pub default: &'static str,
    pub presence: Presence,
    /// Credential-shaped; never displayed
    pub secret: bool,
}

impl KeySpec {
    /// Plain runtime setting: environment or default
    pub const fn config(key: &'static str, default: &'static str) -> Self {
        Self {
            key,
            alternates: &[],
            default,
            presence: Presence::SetWins,
            secret: false,
        }
    }

    /// Credential with legacy aliases; empty entries fall through
    pub const fn secret(
        key: &'static str,
        alternates: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            key,
            alternates,
            default,
            presence: Presence::NonEmptyWins,
            secret: true,
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "variable")]
pub enum ValueSource {
    /// The key itself was set
    Environment,
    /// An alternate key supplied the value
    Alternate(String),
    /// Nothing in the chain was set
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::Alternate(variable) => write!(f, "alternate:{}", variable),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: String,
    pub source: ValueSource,
    pub default: String,
    pub secret: bool,
}

impl ResolvedValue {
    /// Value safe to print
    pub fn display_value(&self) -> &str {
        if self.secret {
            REDACTED
        } else {
            &self.value
        }
    }

    /// Explicitly set to "" while the default would have supplied something
    pub fn is_empty_override(&self) -> bool {
        self.value.is_empty() && !self.default.is_empty() && self.source != ValueSource::Default
    }
}

pub const REDACTED: &str = "<redacted>";

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedValue")
            .field("value", &self.display_value())
            .field("source", &self.source)
            .field("secret", &self.secret)
            .finish()
    }
}

/// Every known key mapped to its resolved value. Built once, read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.value.as_str())
    }

    /// Value of a key known to be in the table; unknown keys read as ""
    pub fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn entry(&self, key: &str) -> Option<&ResolvedValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys explicitly set to "" that mask a non-empty default
    pub fn empty_overrides(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| v.is_empty_override())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves keys against a snapshot using a table of [`KeySpec`]s.
///
/// Keys missing from the table resolve with the plain rule: the environment
/// if set, otherwise the default.
pub struct Resolver<'a> {
    snapshot: &'a EnvironmentSnapshot,
    table: &'a [KeySpec],
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a EnvironmentSnapshot, table: &'a [KeySpec]) -> Self {
        Self { snapshot, table }
    }

    pub fn spec(&self, key: &str) -> Option<&'a KeySpec> {
        self.table.iter().find(|spec| spec.key == key)
    }

    /// Effective value of `key`, or `default` when nothing in its chain is set
    pub fn resolve(&self, key: &str, default: &str) -> String {
        match self.lookup(key, Presence::SetWins, &mut Vec::new()) {
            Some((value, _)) => value,
            None => default.to_string(),
        }
    }

    pub fn resolve_spec(&self, spec: &KeySpec) -> ResolvedValue {
        let (value, source) = self
            .lookup(spec.key, spec.presence, &mut Vec::new())
            .unwrap_or_else(|| (spec.default.to_string(), ValueSource::Default));
        ResolvedValue {
            value,
            source,
            default: spec.default.to_string(),
            secret: spec.secret,
        }
    }

    /// Resolve every key in the table
    pub fn resolve_all(&self) -> ResolvedConfig {
        let values = self
            .table
            .iter()
            .map(|spec| (spec.key.to_string(), self.resolve_spec(spec)))
            .collect();
        ResolvedConfig { values }
    }

    // A key's own table entry decides its presence rule and alternates;
    // alternates without an entry inherit the rule of the key that named them.
    fn lookup(
        &self,
        key: &str,
        inherited: Presence,
        visiting: &mut Vec<String>,
    ) -> Option<(String, ValueSource)> {
        if visiting.iter().any(|k| k == key) {
            return None;
        }
        visiting.push(key.to_string());

        let spec = self.spec(key);
        let presence = spec.map(|s| s.presence).unwrap_or(inherited);

        if let Some(value) = self.snapshot.get(key) {
            if presence.accepts(value) {
                return Some((value.to_string(), ValueSource::Environment));
            }
        }

        let alternates = spec.map(|s| s.alternates).unwrap_or_default();
        for alternate in alternates {
            if let Some((value, source)) = self.lookup(alternate, presence, visiting) {
                let source = match source {
                    ValueSource::Environment => ValueSource::Alternate(alternate.to_string()),
                    other => other,
                };
                return Some((value, source));
            }
        }
        None
    }
}

/// Resolve `key` against the service key table: a set value (even "") wins,
/// then the key's designated alternates, then `default`.
///
/// Keys the table does not know resolve with the plain rule.
pub fn resolve(snapshot: &EnvironmentSnapshot, key: &str, default: &str) -> String {
    let keys = octowalrus_keys();
    Resolver::new(snapshot, &keys).resolve(key, default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[KeySpec] = &[
        KeySpec::config("LOG_LEVEL", "INFO"),
        KeySpec::secret("S3_ACCESS_KEY", &["MINIO_ROOT_USER"], "admin"),
        KeySpec::config("PRIMARY", "p-default"),
        KeySpec {
            key: "CHAINED",
            alternates: &["PRIMARY"],
            default: "c-default",
            presence: Presence::SetWins,
            secret: false,
        },
        KeySpec {
            key: "LOOP_A",
            alternates: &["LOOP_B"],
            default: "a",
            presence: Presence::SetWins,
            secret: false,
        },
        KeySpec {
            key: "LOOP_B",
            alternates: &["LOOP_A"],
            default: "b",
            presence: Presence::SetWins,
            secret: false,
        },
    ];

    fn snapshot(pairs: &[(&str, &str)]) -> EnvironmentSnapshot {
        EnvironmentSnapshot::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_present_key_wins() {
        let env = snapshot(&[("APP_ENV", "staging")]);
        assert_eq!(resolve(&env, "APP_ENV", "development"), "staging");
    }

    #[test]
    fn test_absent_key_defaults() {
        let env = snapshot(&[]);
        assert_eq!(resolve(&env, "APP_ENV", "development"), "development");
    }

    #[test]
    fn test_resolve_checks_designated_alternate() {
        let env = snapshot(&[("MINIO_ROOT_USER", "minio")]);
        assert_eq!(resolve(&env, "S3_ACCESS_KEY", "admin"), "minio");

        let env = snapshot(&[("S3_SECRET_KEY", "s3"), ("MINIO_ROOT_PASSWORD", "minio")]);
        assert_eq!(resolve(&env, "S3_SECRET_KEY", "password"), "s3");

        let env = snapshot(&[]);
        assert_eq!(resolve(&env, "S3_ACCESS_KEY", "admin"), "admin");
    }

    #[test]
    fn test_empty_value_is_an_override() {
        let env = snapshot(&[("LOG_LEVEL", "")]);
        let resolver = Resolver::new(&env, TABLE);
        assert_eq!(resolver.resolve("LOG_LEVEL", "INFO"), "");

        let resolved = resolver.resolve_spec(&TABLE[0]);
        assert_eq!(resolved.value, "");
        assert_eq!(resolved.source, ValueSource::Environment);
        assert!(resolved.is_empty_override());
    }

    #[test]
    fn test_alternate_used_when_primary_absent() {
        let env = snapshot(&[("MINIO_ROOT_USER", "minio")]);
        let resolved = Resolver::new(&env, TABLE).resolve_spec(&TABLE[1]);
        assert_eq!(resolved.value, "minio");
        assert_eq!(
            resolved.source,
            ValueSource::Alternate("MINIO_ROOT_USER".to_string())
        );
    }

    #[test]
    fn test_secret_chain_skips_empty_candidates() {
        let env = snapshot(&[("S3_ACCESS_KEY", ""), ("MINIO_ROOT_USER", "minio")]);
        let resolved = Resolver::new(&env, TABLE).resolve_spec(&TABLE[1]);
        assert_eq!(resolved.value, "minio");

        let env = snapshot(&[("S3_ACCESS_KEY", ""), ("MINIO_ROOT_USER", "")]);
        let resolved = Resolver::new(&env, TABLE).resolve_spec(&TABLE[1]);
        assert_eq!(resolved.value, "admin");
        assert_eq!(resolved.source, ValueSource::Default);
    }

    #[test]
    fn test_secret_falls_back_to_literal_default() {
        let env = snapshot(&[]);
        let config = Resolver::new(&env, TABLE).resolve_all();
        assert_eq!(config.get("S3_ACCESS_KEY"), Some("admin"));
    }

    #[test]
    fn test_alternate_is_resolved_recursively() {
        let env = snapshot(&[("PRIMARY", "")]);
        let resolver = Resolver::new(&env, TABLE);
        // PRIMARY is set (to ""), so CHAINED takes it rather than its default
        assert_eq!(resolver.resolve("CHAINED", "c-default"), "");

        let env = snapshot(&[]);
        let resolver = Resolver::new(&env, TABLE);
        assert_eq!(resolver.resolve("CHAINED", "c-default"), "c-default");
    }

    #[test]
    fn test_alternate_cycle_terminates() {
        let env = snapshot(&[]);
        let resolver = Resolver::new(&env, TABLE);
        assert_eq!(resolver.resolve("LOOP_A", "a"), "a");

        let env = snapshot(&[("LOOP_A", "set")]);
        let resolver = Resolver::new(&env, TABLE);
        assert_eq!(resolver.resolve("LOOP_B", "b"), "set");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let env = snapshot(&[("S3_ACCESS_KEY", "AKIA-very-secret")]);
        let config = Resolver::new(&env, TABLE).resolve_all();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("AKIA-very-secret"));
        assert!(debug.contains(REDACTED));
    }

    #[test]
    fn test_resolve_all_is_deterministic() {
        let env = snapshot(&[("LOG_LEVEL", "DEBUG"), ("MINIO_ROOT_USER", "minio")]);
        let first = Resolver::new(&env, TABLE).resolve_all();
        let second = Resolver::new(&env, TABLE).resolve_all();
        assert_eq!(first, second);
        assert_eq!(first.len(), TABLE.len());
    }

    #[test]
    fn test_empty_overrides_listed() {
        let env = snapshot(&[("LOG_LEVEL", ""), ("PRIMARY", "x")]);
        let config = Resolver::new(&env, TABLE).resolve_all();
        assert_eq!(config.empty_overrides(), vec!["LOG_LEVEL"]);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ValueSource::Environment.to_string(), "environment");
        assert_eq!(
            ValueSource::Alternate("MINIO_ROOT_USER".into()).to_string(),
            "alternate:MINIO_ROOT_USER"
        );
        assert_eq!(ValueSource::Default.to_string(), "default");
    }
}
