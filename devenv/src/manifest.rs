//! Kubernetes manifests for the config and secret objects.
//!
//! Everything else in a plan is rendered by the chart system or acted on by
//! the orchestrator directly, so this renderer only writes `ConfigMap` and
//! `Secret` documents.

use crate::declaration::{ConfigObject, SecretObject};
use crate::orchestrator::{HandoffResult, Orchestrator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

const MANAGED_BY: &str = "devenv";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata<'a>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    secret_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    string_data: Option<&'a BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    name: &'a str,
    namespace: &'a str,
    labels: BTreeMap<&'static str, &'static str>,
}

/// Writes one YAML document per config or secret object
pub struct ManifestRenderer<W: Write> {
    out: W,
    namespace: String,
    documents: usize,
}

impl<W: Write> ManifestRenderer<W> {
    pub fn new(out: W, namespace: impl Into<String>) -> Self {
        Self {
            out,
            namespace: namespace.into(),
            documents: 0,
        }
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn metadata<'a>(&'a self, name: &'a str) -> Metadata<'a> {
        Metadata {
            name,
            namespace: &self.namespace,
            labels: BTreeMap::from([("app.kubernetes.io/managed-by", MANAGED_BY)]),
        }
    }

    fn write_rendered(&mut self, rendered: String) -> HandoffResult<()> {
        writeln!(self.out, "---")?;
        self.out.write_all(rendered.as_bytes())?;
        self.documents += 1;
        Ok(())
    }
}

impl<W: Write> Orchestrator for ManifestRenderer<W> {
    fn config_object(&mut self, object: &ConfigObject) -> HandoffResult<()> {
        let rendered = serde_yaml::to_string(&Manifest {
            api_version: "v1",
            kind: "ConfigMap",
            metadata: self.metadata(&object.name),
            secret_type: None,
            data: Some(&object.data),
            string_data: None,
        })?;
        self.write_rendered(rendered)
    }

    fn secret_object(&mut self, object: &SecretObject) -> HandoffResult<()> {
        let rendered = serde_yaml::to_string(&Manifest {
            api_version: "v1",
            kind: "Secret",
            metadata: self.metadata(&object.name),
            secret_type: Some("Opaque"),
            data: None,
            string_data: Some(&object.data),
        })?;
        self.write_rendered(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::layout::Layout;
    use crate::orchestrator::handoff;
    use envconf::{octowalrus_keys, EnvironmentSnapshot, Resolver};

    fn render(pairs: &[(&str, &str)]) -> (String, usize) {
        let env = EnvironmentSnapshot::from_pairs(pairs.iter().copied());
        let keys = octowalrus_keys();
        let config = Resolver::new(&env, &keys).resolve_all();
        let plan = assemble(&config, &Layout::default(), "dev");

        let mut renderer = ManifestRenderer::new(Vec::new(), plan.chart.namespace.clone());
        handoff(&plan, &mut renderer).unwrap();
        let documents = renderer.documents();
        (String::from_utf8(renderer.into_inner()).unwrap(), documents)
    }

    #[test]
    fn test_renders_config_and_secrets_only() {
        let (yaml, documents) = render(&[]);
        assert_eq!(documents, 3);
        assert_eq!(yaml.matches("---\n").count(), 3);
        assert_eq!(yaml.matches("kind: ConfigMap").count(), 1);
        assert_eq!(yaml.matches("kind: Secret").count(), 2);
        assert!(yaml.contains("type: Opaque"));
        assert!(yaml.contains("stringData:"));
        assert!(yaml.contains("app.kubernetes.io/managed-by: devenv"));
    }

    #[test]
    fn test_documents_parse_back() {
        let (yaml, _) = render(&[("APP_ENV", "staging")]);
        let documents: Vec<serde_yaml::Value> = yaml
            .split("---\n")
            .filter(|doc| !doc.trim().is_empty())
            .map(|doc| serde_yaml::from_str(doc).unwrap())
            .collect();

        let config_map = &documents[0];
        assert_eq!(config_map["apiVersion"], "v1");
        assert_eq!(config_map["metadata"]["name"], "octowalrus-config");
        assert_eq!(config_map["metadata"]["namespace"], "default");
        assert_eq!(config_map["data"]["APP_ENV"], "staging");
        assert_eq!(documents[1]["stringData"]["S3_ACCESS_KEY"], "admin");
    }
}
