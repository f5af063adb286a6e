//! Turns resolved configuration into the fixed set of declarations.
//!
//! Assembly is total and deterministic: it reads only the resolved values,
//! the layout and the build revision, and always yields the same plan for
//! the same inputs.

use crate::declaration::{
    ChartInvocation, ConfigObject, ExposureDescriptor, Link, Plan, PortForward,
    ResourceDeclaration, SecretObject,
};
use crate::layout::Layout;
use envconf::keys::*;
use envconf::settings::{flag, is_development};
use envconf::ResolvedConfig;
use image_builder::{BuildDescriptor, LiveUpdate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub struct Assembler<'a> {
    config: &'a ResolvedConfig,
    layout: &'a Layout,
    git_sha: &'a str,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a ResolvedConfig, layout: &'a Layout, git_sha: &'a str) -> Self {
        Self {
            config,
            layout,
            git_sha,
        }
    }

    pub fn assemble(&self) -> Plan {
        let declarations = vec![
            ResourceDeclaration::ConfigObject(self.config_object()),
            ResourceDeclaration::SecretObject(self.service_secret()),
            ResourceDeclaration::SecretObject(self.object_store_secret()),
            ResourceDeclaration::BuildDescriptor(self.build()),
            ResourceDeclaration::ExposureDescriptor(self.object_store_exposure()),
            ResourceDeclaration::ExposureDescriptor(self.service_exposure()),
        ];
        debug!(count = declarations.len(), "assembled declarations");

        Plan {
            chart: self.chart(),
            declarations,
        }
    }

    pub fn config_object(&self) -> ConfigObject {
        let data = CONFIG_KEYS
            .iter()
            .map(|spec| (spec.key.to_string(), self.config.value(spec.key)))
            .collect();
        ConfigObject {
            name: format!("{}-config", self.layout.service.name),
            data,
        }
    }

    pub fn service_secret(&self) -> SecretObject {
        let data = SECRET_KEYS
            .iter()
            .map(|spec| (spec.key.to_string(), self.config.value(spec.key)))
            .collect();
        SecretObject {
            name: format!("{}-secrets", self.layout.service.name),
            data,
            redact: true,
        }
    }

    /// Root credentials for the object store, identical to what the service uses
    pub fn object_store_secret(&self) -> SecretObject {
        let data = BTreeMap::from([
            (MINIO_ROOT_USER.to_string(), self.config.value(S3_ACCESS_KEY)),
            (
                MINIO_ROOT_PASSWORD.to_string(),
                self.config.value(S3_SECRET_KEY),
            ),
        ]);
        SecretObject {
            name: format!("{}-credentials", self.layout.object_store.name),
            data,
            redact: true,
        }
    }

    pub fn build(&self) -> BuildDescriptor {
        let service = &self.layout.service;

        let mut live_update = LiveUpdate::new();
        for sentinel in &service.fall_back_on {
            live_update = live_update.fall_back_on(sentinel.clone());
        }
        for entry in &service.sync {
            live_update = live_update.sync(entry.source.clone(), entry.destination.clone());
        }

        let mut build = BuildDescriptor::new(service.image.clone(), service.context.clone())
            .with_dockerfile(service.dockerfile.clone())
            .with_build_arg(APP_ENV, self.config.value(APP_ENV))
            .with_build_arg("GIT_SHA", self.git_sha)
            .with_live_update(live_update);
        for glob in &service.ignore {
            build = build.with_ignore(glob.clone());
        }
        build
    }

    pub fn service_exposure(&self) -> ExposureDescriptor {
        let service = &self.layout.service;
        let mut port_forwards = vec![PortForward::new(
            service.local_port,
            service.container_port,
            "http",
        )];

        if flag(&self.config.value(DEBUGPY_ENABLED)) {
            match self.config.value(DEBUGPY_PORT).trim().parse::<u16>() {
                Ok(port) => port_forwards.push(PortForward::new(port, port, "debugpy")),
                Err(_) => warn!(
                    value = %self.config.value(DEBUGPY_PORT),
                    "DEBUGPY_PORT is not a port number, debugger will not be forwarded"
                ),
            }
        }

        let base = format!("http://localhost:{}", service.local_port);
        let mut links = vec![Link::new("API", base.clone())];
        // the service only serves interactive docs in development
        if is_development(&self.config.value(APP_ENV)) {
            links.push(Link::new("API docs", format!("{}/docs", base)));
        }

        ExposureDescriptor {
            workload: service.name.clone(),
            port_forwards,
            resource_deps: vec![self.layout.object_store.name.clone()],
            links,
        }
    }

    pub fn object_store_exposure(&self) -> ExposureDescriptor {
        let store = &self.layout.object_store;
        ExposureDescriptor {
            workload: store.name.clone(),
            port_forwards: vec![
                PortForward::new(store.local_api_port, store.api_port, "api"),
                PortForward::new(store.local_console_port, store.console_port, "console"),
            ],
            resource_deps: Vec::new(),
            links: vec![Link::new(
                "Object store console",
                format!("http://localhost:{}", store.local_console_port),
            )],
        }
    }

    pub fn chart(&self) -> ChartInvocation {
        let chart = &self.layout.chart;
        let environment = self.config.value(APP_ENV);
        ChartInvocation {
            values_file: chart.values_file_for(&environment),
            environment,
            chart: chart.path.clone(),
            release: chart.release.clone(),
            namespace: chart.namespace.clone(),
        }
    }
}

/// Assemble the plan for `config` with the given layout and build revision
pub fn assemble(config: &ResolvedConfig, layout: &Layout, git_sha: &str) -> Plan {
    Assembler::new(config, layout, git_sha).assemble()
}
