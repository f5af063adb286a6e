//! Inert descriptions of the cluster resources the orchestrator should
//! create. Values are copied in at assembly time; nothing here looks
//! anything up later.

use envconf::REDACTED;
use image_builder::BuildDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Non-secret key/value configuration for a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigObject {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

/// Credential key/value pairs.
///
/// `redact` tells the orchestrator to scrub these values from its own
/// output; this crate never prints them regardless.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SecretObject {
    pub name: String,
    pub data: BTreeMap<String, String>,
    pub redact: bool,
}

impl fmt::Debug for SecretObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: BTreeMap<&str, &str> = self
            .data
            .keys()
            .map(|k| (k.as_str(), REDACTED))
            .collect();
        f.debug_struct("SecretObject")
            .field("name", &self.name)
            .field("data", &keys)
            .field("redact", &self.redact)
            .finish()
    }
}

/// Local port `local` forwarded to `container` on the workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortForward {
    pub local: u16,
    pub container: u16,
    pub name: String,
}

impl PortForward {
    pub fn new(local: u16, container: u16, name: impl Into<String>) -> Self {
        Self {
            local,
            container,
            name: name.into(),
        }
    }
}

impl fmt::Display for PortForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.local, self.container)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl Link {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// How a workload is reached from the developer's machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposureDescriptor {
    pub workload: String,
    pub port_forwards: Vec<PortForward>,
    /// Workloads that must be ready first; declared, not enforced
    pub resource_deps: Vec<String>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDeclaration {
    ConfigObject(ConfigObject),
    SecretObject(SecretObject),
    BuildDescriptor(BuildDescriptor),
    ExposureDescriptor(ExposureDescriptor),
}

impl ResourceDeclaration {
    pub fn name(&self) -> &str {
        match self {
            ResourceDeclaration::ConfigObject(object) => &object.name,
            ResourceDeclaration::SecretObject(object) => &object.name,
            ResourceDeclaration::BuildDescriptor(build) => &build.image,
            ResourceDeclaration::ExposureDescriptor(exposure) => &exposure.workload,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceDeclaration::ConfigObject(_) => "config_object",
            ResourceDeclaration::SecretObject(_) => "secret_object",
            ResourceDeclaration::BuildDescriptor(_) => "build_descriptor",
            ResourceDeclaration::ExposureDescriptor(_) => "exposure_descriptor",
        }
    }
}

/// Arguments for the external chart system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartInvocation {
    pub environment: String,
    pub chart: PathBuf,
    pub values_file: PathBuf,
    pub release: String,
    pub namespace: String,
}

/// Everything handed to the orchestrator for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub chart: ChartInvocation,
    pub declarations: Vec<ResourceDeclaration>,
}

impl Plan {
    pub fn config_objects(&self) -> impl Iterator<Item = &ConfigObject> {
        self.declarations.iter().filter_map(|d| match d {
            ResourceDeclaration::ConfigObject(object) => Some(object),
            _ => None,
        })
    }

    pub fn secret_objects(&self) -> impl Iterator<Item = &SecretObject> {
        self.declarations.iter().filter_map(|d| match d {
            ResourceDeclaration::SecretObject(object) => Some(object),
            _ => None,
        })
    }

    pub fn builds(&self) -> impl Iterator<Item = &BuildDescriptor> {
        self.declarations.iter().filter_map(|d| match d {
            ResourceDeclaration::BuildDescriptor(build) => Some(build),
            _ => None,
        })
    }

    pub fn exposures(&self) -> impl Iterator<Item = &ExposureDescriptor> {
        self.declarations.iter().filter_map(|d| match d {
            ResourceDeclaration::ExposureDescriptor(exposure) => Some(exposure),
            _ => None,
        })
    }

    pub fn exposure(&self, workload: &str) -> Option<&ExposureDescriptor> {
        self.exposures().find(|e| e.workload == workload)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretObject {
        SecretObject {
            name: "octowalrus-secrets".to_string(),
            data: BTreeMap::from([("S3_SECRET_KEY".to_string(), "s3cr3t-value".to_string())]),
            redact: true,
        }
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let debug = format!("{:?}", ResourceDeclaration::SecretObject(secret()));
        assert!(debug.contains("S3_SECRET_KEY"));
        assert!(!debug.contains("s3cr3t-value"));
    }

    #[test]
    fn test_declaration_is_tagged() {
        let json = serde_json::to_value(ResourceDeclaration::ConfigObject(ConfigObject {
            name: "octowalrus-config".to_string(),
            data: BTreeMap::new(),
        }))
        .unwrap();
        assert_eq!(json["kind"], "config_object");
        assert_eq!(json["name"], "octowalrus-config");
    }

    #[test]
    fn test_name_and_kind() {
        let declaration =
            ResourceDeclaration::BuildDescriptor(BuildDescriptor::new("octowalrus", "."));
        assert_eq!(declaration.name(), "octowalrus");
        assert_eq!(declaration.kind(), "build_descriptor");
    }

    #[test]
    fn test_port_forward_display() {
        assert_eq!(PortForward::new(19000, 9000, "api").to_string(), "19000:9000");
    }
}
