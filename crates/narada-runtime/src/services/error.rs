//! Service orchestration errors.

use std::fmt;
use std::path::PathBuf;

use narada_core::ServiceKind;
use thiserror::Error;

use crate::process::SupervisorError;

/// A file a service needs before it can be spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    RelayExecutable,
    AnalyzerScript,
    AnalyzerModel,
    Interpreter,
}

impl Prerequisite {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RelayExecutable => "Relay executable",
            Self::AnalyzerScript => "Script",
            Self::AnalyzerModel => "Model",
            Self::Interpreter => "Python",
        }
    }
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an orchestration request failed. Failures end the attempt; nothing is
/// retried automatically.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{prerequisite} not found: {}", .path.display())]
    PrerequisiteMissing {
        prerequisite: Prerequisite,
        path: PathBuf,
    },

    #[error("License is not valid; {} not started", .0.label())]
    Unlicensed(ServiceKind),

    #[error("Failed to write relay config {}: {reason}", .path.display())]
    ConfigWrite { path: PathBuf, reason: String },

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}
