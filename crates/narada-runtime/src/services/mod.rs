//! Relay and analyzer lifecycle management.

mod error;
mod orchestrator;

pub use error::{Prerequisite, ServiceError};
pub use orchestrator::{
    DEFAULT_RELAY_CONFIG, OrchestratorOptions, ServiceOrchestrator, ServiceSnapshot, ServiceState,
    StartOutcome,
};
