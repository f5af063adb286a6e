//! Development environment for the octowalrus service.
//!
//! Resolves configuration from the environment, assembles the declarations
//! the orchestrator needs (config and secret objects, the image build with
//! its live-update rules, port forwards) and hands them off. Nothing in this
//! crate builds, deploys or runs anything.

pub mod assembler;
pub mod declaration;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod session;
pub mod validate;

pub use assembler::{assemble, Assembler};
pub use declaration::{
    ChartInvocation, ConfigObject, ExposureDescriptor, Link, Plan, PortForward,
    ResourceDeclaration, SecretObject,
};
pub use layout::{Layout, LayoutError};
pub use manifest::ManifestRenderer;
pub use orchestrator::{handoff, HandoffError, HandoffResult, Orchestrator, PlanRecorder};
pub use session::Session;
pub use validate::{validate, ValidationError, ValidationIssue};
