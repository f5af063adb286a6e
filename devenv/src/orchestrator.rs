//! Handoff seam to the external orchestrator.

use crate::declaration::{
    ChartInvocation, ConfigObject, ExposureDescriptor, Plan, ResourceDeclaration, SecretObject,
};
use image_builder::BuildDescriptor;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HandoffResult<T> = Result<T, HandoffError>;

/// Receiver of declarations.
///
/// Each call declares intent only; implementations decide what to do with
/// it. Kinds an implementation does not care about default to no-ops.
pub trait Orchestrator {
    fn chart(&mut self, _chart: &ChartInvocation) -> HandoffResult<()> {
        Ok(())
    }

    fn config_object(&mut self, _object: &ConfigObject) -> HandoffResult<()> {
        Ok(())
    }

    fn secret_object(&mut self, _object: &SecretObject) -> HandoffResult<()> {
        Ok(())
    }

    fn build(&mut self, _build: &BuildDescriptor) -> HandoffResult<()> {
        Ok(())
    }

    fn exposure(&mut self, _exposure: &ExposureDescriptor) -> HandoffResult<()> {
        Ok(())
    }
}

/// Pass every part of `plan` to `orchestrator`, chart first, then the
/// declarations in plan order
pub fn handoff<O: Orchestrator + ?Sized>(plan: &Plan, orchestrator: &mut O) -> HandoffResult<()> {
    orchestrator.chart(&plan.chart)?;
    for declaration in &plan.declarations {
        // names only; values may be credentials
        debug!(kind = declaration.kind(), name = declaration.name(), "handing off");
        match declaration {
            ResourceDeclaration::ConfigObject(object) => orchestrator.config_object(object)?,
            ResourceDeclaration::SecretObject(object) => orchestrator.secret_object(object)?,
            ResourceDeclaration::BuildDescriptor(build) => orchestrator.build(build)?,
            ResourceDeclaration::ExposureDescriptor(exposure) => orchestrator.exposure(exposure)?,
        }
    }
    info!(
        declarations = plan.declarations.len(),
        environment = %plan.chart.environment,
        "handed off plan"
    );
    Ok(())
}

/// Records what it is handed, rebuilding the plan as the orchestrator saw it
#[derive(Debug, Default)]
pub struct PlanRecorder {
    chart: Option<ChartInvocation>,
    declarations: Vec<ResourceDeclaration>,
}

impl PlanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    /// `None` until a chart invocation has been received
    pub fn into_plan(self) -> Option<Plan> {
        Some(Plan {
            chart: self.chart?,
            declarations: self.declarations,
        })
    }
}

impl Orchestrator for PlanRecorder {
    fn chart(&mut self, chart: &ChartInvocation) -> HandoffResult<()> {
        self.chart = Some(chart.clone());
        Ok(())
    }

    fn config_object(&mut self, object: &ConfigObject) -> HandoffResult<()> {
        self.declarations
            .push(ResourceDeclaration::ConfigObject(object.clone()));
        Ok(())
    }

    fn secret_object(&mut self, object: &SecretObject) -> HandoffResult<()> {
        self.declarations
            .push(ResourceDeclaration::SecretObject(object.clone()));
        Ok(())
    }

    fn build(&mut self, build: &BuildDescriptor) -> HandoffResult<()> {
        self.declarations
            .push(ResourceDeclaration::BuildDescriptor(build.clone()));
        Ok(())
    }

    fn exposure(&mut self, exposure: &ExposureDescriptor) -> HandoffResult<()> {
        self.declarations
            .push(ResourceDeclaration::ExposureDescriptor(exposure.clone()));
        Ok(())
    }
}
