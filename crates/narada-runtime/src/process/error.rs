//! Supervisor error types.

use std::path::PathBuf;
use std::time::Duration;

use narada_core::ProcessKind;
use thiserror::Error;

/// Failures of supervisor operations. Each is terminal for the attempt only.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The executable does not exist, or a bare command is not on `PATH`.
    #[error("{} executable not found: {}", .kind.label(), .path.display())]
    NotFound { kind: ProcessKind, path: PathBuf },

    /// The OS refused to create the process.
    #[error("Failed to start {}: {reason}", .kind.label())]
    SpawnFailed { kind: ProcessKind, reason: String },

    /// A one-shot run did not finish in time and was stopped.
    #[error("{} did not finish within {}s", .kind.label(), .after.as_secs_f64())]
    Timeout { kind: ProcessKind, after: Duration },

    /// A one-shot run was stopped or superseded before it finished.
    #[error("{} was stopped before it finished", .kind.label())]
    Interrupted { kind: ProcessKind },
}
