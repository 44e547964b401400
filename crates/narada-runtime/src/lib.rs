//! Process supervision, license reconciliation and service orchestration.
//!
//! Everything that spawns, watches or signals an OS process lives here. The
//! shapes it exchanges with callers come from `narada-core`.

#![deny(unsafe_code)]

mod app;
pub mod license;
pub mod process;
pub mod services;
pub mod store;
pub mod streams;

pub use app::{NaradaRuntime, RuntimeConfig, RuntimeError};

pub use license::{CheckSchedule, CheckerCommand, LicenseCell, LicenseError, LicenseReconciler};

pub use process::{
    ChildProcessSupervisor, ExitReport, LaunchSpec, LineProtocolDecoder, OutputMode,
    ProcessHandle, ProcessHooks, SupervisorError,
};

pub use services::{
    OrchestratorOptions, Prerequisite, ServiceError, ServiceOrchestrator, ServiceSnapshot,
    ServiceState, StartOutcome,
};

pub use store::{PresetStore, SettingsStore, StreamStore};
pub use streams::{ProbeError, ProbeReport, probe_stream};
