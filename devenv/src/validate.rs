//! Schema checks run over a plan before it is handed off.
//!
//! The orchestrator would reject most of these eventually, but only after a
//! build or an apply; catching them here keeps the failure next to the
//! configuration that caused it.

use crate::declaration::{Plan, ResourceDeclaration};
use envconf::is_http_url;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// One problem found in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// `kind/name` of the offending declaration
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("plan failed validation with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn dns_label() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static regex"))
}

fn data_key() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^[-._a-zA-Z0-9]+$").expect("static regex"))
}

fn is_dns_label(name: &str) -> bool {
    name.len() <= 63 && dns_label().is_match(name)
}

/// Every issue in `plan`, in declaration order
pub fn issues(plan: &Plan) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let chart_subject = format!("chart/{}", plan.chart.release);
    if plan.chart.environment.trim().is_empty() {
        issues.push(ValidationIssue::new(
            &chart_subject,
            "environment name is empty",
        ));
    }
    if !is_dns_label(&plan.chart.release) {
        issues.push(ValidationIssue::new(
            &chart_subject,
            "release name is not a valid DNS-1123 label",
        ));
    }
    if !is_dns_label(&plan.chart.namespace) {
        issues.push(ValidationIssue::new(
            &chart_subject,
            format!("namespace '{}' is not a valid DNS-1123 label", plan.chart.namespace),
        ));
    }

    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for declaration in &plan.declarations {
        let subject = format!("{}/{}", declaration.kind(), declaration.name());
        if !seen.insert((declaration.kind(), declaration.name())) {
            issues.push(ValidationIssue::new(&subject, "declared more than once"));
        }

        match declaration {
            ResourceDeclaration::ConfigObject(object) => {
                check_object(&subject, &object.name, object.data.keys(), &mut issues);
            }
            ResourceDeclaration::SecretObject(object) => {
                check_object(&subject, &object.name, object.data.keys(), &mut issues);
            }
            ResourceDeclaration::BuildDescriptor(build) => {
                for problem in build.problems() {
                    issues.push(ValidationIssue::new(&subject, problem.to_string()));
                }
            }
            ResourceDeclaration::ExposureDescriptor(exposure) => {
                if !is_dns_label(&exposure.workload) {
                    issues.push(ValidationIssue::new(
                        &subject,
                        "workload name is not a valid DNS-1123 label",
                    ));
                }
                for forward in &exposure.port_forwards {
                    if forward.local == 0 || forward.container == 0 {
                        issues.push(ValidationIssue::new(
                            &subject,
                            format!("port forward {} uses port 0", forward),
                        ));
                    }
                }
                for link in &exposure.links {
                    if !is_http_url(&link.url) {
                        issues.push(ValidationIssue::new(
                            &subject,
                            format!("link '{}' is not an http(s) URL", link.label),
                        ));
                    }
                }
            }
        }
    }

    check_exposure_graph(plan, &mut issues);
    issues
}

fn check_object<'a>(
    subject: &str,
    name: &str,
    keys: impl Iterator<Item = &'a String>,
    issues: &mut Vec<ValidationIssue>,
) {
    if !is_dns_label(name) {
        issues.push(ValidationIssue::new(
            subject,
            "name is not a valid DNS-1123 label",
        ));
    }
    for key in keys {
        if !data_key().is_match(key) {
            issues.push(ValidationIssue::new(
                subject,
                format!("data key '{}' contains characters outside [-._a-zA-Z0-9]", key),
            ));
        }
    }
}

// Local ports must be unique across workloads and dependencies must point
// at declared workloads.
fn check_exposure_graph(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
    let workloads: BTreeSet<&str> = plan.exposures().map(|e| e.workload.as_str()).collect();
    let mut bound: BTreeMap<u16, &str> = BTreeMap::new();

    for exposure in plan.exposures() {
        let subject = format!("exposure_descriptor/{}", exposure.workload);

        for forward in &exposure.port_forwards {
            if forward.local == 0 {
                continue;
            }
            match bound.get(&forward.local) {
                Some(owner) => issues.push(ValidationIssue::new(
                    &subject,
                    format!("local port {} is already forwarded by {}", forward.local, owner),
                )),
                None => {
                    bound.insert(forward.local, exposure.workload.as_str());
                }
            }
        }

        for dependency in &exposure.resource_deps {
            if dependency == &exposure.workload {
                issues.push(ValidationIssue::new(&subject, "depends on itself"));
            } else if !workloads.contains(dependency.as_str()) {
                issues.push(ValidationIssue::new(
                    &subject,
                    format!("depends on undeclared workload '{}'", dependency),
                ));
            }
        }
    }
}

/// Check `plan`, returning every issue at once
pub fn validate(plan: &Plan) -> Result<(), ValidationError> {
    let issues = issues(plan);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}
