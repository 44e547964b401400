//! External process supervision.
//!
//! - `supervisor` owns one slot per process kind and the exit watchers
//! - `decoder` turns stdout/stderr bytes into status events
//! - `shutdown` and `liveness` hold the platform-specific parts

mod decoder;
mod error;
mod liveness;
mod shutdown;
mod spec;
mod stream;
mod supervisor;

pub use decoder::{Channel, LineBuffer, LineProtocolDecoder, decode_line, decode_stderr_line};
pub use error::SupervisorError;
pub use liveness::pid_exists;
pub use spec::{LaunchSpec, OutputMode};
pub use supervisor::{
    ChildProcessSupervisor, ExitHook, ExitReport, ProcessHandle, ProcessHooks, SpawnHook, StopReason,
};
