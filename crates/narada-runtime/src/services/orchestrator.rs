//! Lifecycle of the long-running relay and analyzer services.
//!
//! Each service moves through `Stopped → Starting → Running → Stopping →
//! Stopped` independently; a failed attempt goes straight back to `Stopped`
//! with its error recorded. Transitions out of `Running`/`Stopping` are driven
//! by the supervisor's exit hook, so a stop completes asynchronously and is
//! reported on the same `serviceStatus` path as an unexpected exit.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use narada_core::{
    AnalyzerConfig, AnalyzerEndpoints, LicenseGate, ServiceKind, ServiceLayout, StatusEmitter,
    StatusEvent,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{Prerequisite, ServiceError};
use crate::process::{
    ChildProcessSupervisor, ExitHook, ExitReport, LaunchSpec, ProcessHandle, ProcessHooks,
    SpawnHook,
};

/// Written when the relay has no config yet: accept any published path and
/// serve it on demand.
pub const DEFAULT_RELAY_CONFIG: &str = "# MediaMTX Configuration
paths:
  all:
    source: publisher
    sourceOnDemand: yes
";

/// Slack added to the stop grace period when waiting for an exit.
const EXIT_WAIT_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl ServiceState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Result of a successful `ensure_started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Already `Running` or `Starting`; nothing was spawned.
    AlreadyRunning { pid: Option<u32> },
    Started { pid: u32 },
}

/// Point-in-time view of one service for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    pub kind: ServiceKind,
    pub state: ServiceState,
    pub running: bool,
    pub pid: Option<u32>,
    pub last_error: Option<String>,
    pub last_exit_code: Option<i32>,
    /// Config the analyzer was (or will be) started with.
    pub config: Option<AnalyzerConfig>,
}

/// Tunables that are not derived from the service layout.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub endpoints: AnalyzerEndpoints,
    /// Pause between stop and start in `restart`.
    pub settle: Duration,
}

#[derive(Debug, Default)]
struct ServiceSlot {
    state: ServiceState,
    /// Bumped on every start attempt; hooks from older attempts are ignored.
    attempt: u64,
    handle: Option<ProcessHandle>,
    last_error: Option<String>,
    config: Option<AnalyzerConfig>,
}

impl ServiceSlot {
    /// Process that was asked to stop and has not exited yet.
    fn pending_stop(&self) -> Option<&ProcessHandle> {
        if self.state != ServiceState::Stopping {
            return None;
        }
        self.handle.as_ref().filter(|h| !h.has_exited())
    }
}

type Slots = Arc<Mutex<HashMap<ServiceKind, ServiceSlot>>>;

/// Starts, stops and restarts the relay and analyzer.
pub struct ServiceOrchestrator {
    supervisor: Arc<ChildProcessSupervisor>,
    license: Arc<dyn LicenseGate>,
    emitter: Arc<dyn StatusEmitter>,
    layout: ServiceLayout,
    options: OrchestratorOptions,
    slots: Slots,
}

impl ServiceOrchestrator {
    pub fn new(
        supervisor: Arc<ChildProcessSupervisor>,
        license: Arc<dyn LicenseGate>,
        emitter: Arc<dyn StatusEmitter>,
        layout: ServiceLayout,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            supervisor,
            license,
            emitter,
            layout,
            options,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub const fn layout(&self) -> &ServiceLayout {
        &self.layout
    }

    /// Source and output URLs passed to every analyzer launch.
    pub const fn endpoints(&self) -> &AnalyzerEndpoints {
        &self.options.endpoints
    }

    /// Start `kind` unless it is already running or starting.
    ///
    /// For the analyzer, `config` replaces the stored config; `None` reuses
    /// the stored one (or an empty config). The relay additionally requires a
    /// valid license. License, prerequisite and spawn failures end the
    /// attempt in `Stopped` with a `serviceStatus(error=true)` event.
    pub fn ensure_started(
        &self,
        kind: ServiceKind,
        config: Option<AnalyzerConfig>,
    ) -> Result<StartOutcome, ServiceError> {
        let (attempt, config) = {
            let mut slots = self.lock();
            let slot = slots.entry(kind).or_default();
            if kind == ServiceKind::Analyzer && config.is_some() {
                slot.config = config;
            }

            if slot.state.is_active() {
                debug!(kind = %kind, state = ?slot.state, "already active");
                return Ok(StartOutcome::AlreadyRunning {
                    pid: slot.handle.as_ref().map(ProcessHandle::pid),
                });
            }

            if kind == ServiceKind::Relay && !self.license.is_licensed() {
                // Nothing is spawned, so a stop in progress keeps its attempt
                (slot.attempt, None)
            } else {
                slot.state = ServiceState::Starting;
                slot.attempt += 1;
                slot.last_error = None;
                (slot.attempt, Some(slot.config.clone().unwrap_or_default()))
            }
        };
        let Some(config) = config else {
            return Err(self.fail_attempt(kind, attempt, ServiceError::Unlicensed(kind)));
        };

        let spec = match self.prepare(kind, &config) {
            Ok(spec) => spec,
            Err(e) => return Err(self.fail_attempt(kind, attempt, e)),
        };

        let hooks = ProcessHooks {
            on_spawn: Some(self.spawn_hook(kind, attempt)),
            on_exit: Some(self.exit_hook(kind, attempt)),
        };
        match self.supervisor.start(spec, hooks) {
            Ok(handle) => Ok(StartOutcome::Started { pid: handle.pid() }),
            Err(e) => Err(self.fail_attempt(kind, attempt, e.into())),
        }
    }

    /// Ask `kind` to stop. Completion is signalled by the exit watcher; await
    /// the returned handle to observe it. While an earlier stop is still in
    /// progress the handle of that process is returned again.
    pub fn stop(&self, kind: ServiceKind) -> Option<ProcessHandle> {
        self.stop_inner(kind, true)
    }

    /// Stop, wait for the exit, pause for the settle delay, start again.
    pub async fn restart(&self, kind: ServiceKind) -> Result<StartOutcome, ServiceError> {
        info!(kind = %kind, settle_ms = self.options.settle.as_millis(), "restarting service");
        if let Some(handle) = self.stop(kind) {
            self.await_exit(&handle).await;
        }
        tokio::time::sleep(self.options.settle).await;
        self.ensure_started(kind, None)
    }

    /// Replace the analyzer config and restart it. A running analyzer is
    /// never reconfigured in place.
    pub async fn reconfigure_analyzer(
        &self,
        config: AnalyzerConfig,
    ) -> Result<StartOutcome, ServiceError> {
        self.lock().entry(ServiceKind::Analyzer).or_default().config = Some(config);
        self.restart(ServiceKind::Analyzer).await
    }

    pub fn get_status(&self, kind: ServiceKind) -> ServiceSnapshot {
        let slots = self.lock();
        let slot = slots.get(&kind);
        let state = slot.map_or(ServiceState::Stopped, |s| s.state);
        ServiceSnapshot {
            kind,
            state,
            running: state == ServiceState::Running,
            pid: slot.and_then(|s| s.handle.as_ref().map(ProcessHandle::pid)),
            last_error: slot.and_then(|s| s.last_error.clone()),
            last_exit_code: self.supervisor.last_exit_code(kind.process_kind()),
            config: match kind {
                ServiceKind::Analyzer => slot.and_then(|s| s.config.clone()),
                ServiceKind::Relay => None,
            },
        }
    }

    /// Probe the OS for the service's process. Independent of the tracked
    /// state; used by explicit "check status" actions.
    pub fn probe_alive(&self, kind: ServiceKind) -> bool {
        self.supervisor
            .current(kind.process_kind())
            .is_some_and(|handle| self.supervisor.is_alive(&handle))
    }

    pub fn analyzer_config(&self) -> Option<AnalyzerConfig> {
        self.lock()
            .get(&ServiceKind::Analyzer)
            .and_then(|s| s.config.clone())
    }

    /// Stop both services and wait (bounded) for them to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<ProcessHandle> = ServiceKind::ALL
            .into_iter()
            .filter_map(|kind| self.stop_inner(kind, false))
            .collect();
        for handle in &handles {
            self.await_exit(handle).await;
        }
        info!(stopped = handles.len(), "services shut down");
    }

    fn stop_inner(&self, kind: ServiceKind, announce_idle: bool) -> Option<ProcessHandle> {
        {
            let mut slots = self.lock();
            let slot = slots.entry(kind).or_default();
            if slot.state.is_active() {
                slot.state = ServiceState::Stopping;
            }
        }

        if let Some(handle) = self.supervisor.stop(kind.process_kind()) {
            return Some(handle);
        }

        {
            let mut slots = self.lock();
            let slot = slots.entry(kind).or_default();
            if let Some(pending) = slot.pending_stop() {
                debug!(kind = %kind, pid = pending.pid(), "stop already in progress");
                return Some(pending.clone());
            }
            slot.state = ServiceState::Stopped;
            slot.handle = None;
        }
        if announce_idle {
            self.emitter
                .emit(StatusEvent::stopped(kind.process_kind(), "Stopped"));
        }
        None
    }

    async fn await_exit(&self, handle: &ProcessHandle) {
        let bound = self.supervisor.stop_grace() + EXIT_WAIT_SLACK;
        if tokio::time::timeout(bound, handle.wait_exit()).await.is_err() {
            warn!(kind = %handle.kind(), pid = handle.pid(), "process did not exit in time");
        }
    }

    fn prepare(&self, kind: ServiceKind, config: &AnalyzerConfig) -> Result<LaunchSpec, ServiceError> {
        let layout = &self.layout;
        match kind {
            ServiceKind::Relay => {
                require(&layout.relay_exe, Prerequisite::RelayExecutable)?;
                ensure_relay_config(&layout.relay_config)?;
                Ok(LaunchSpec::new(kind.process_kind(), &layout.relay_exe)
                    .arg(layout.relay_config.to_string_lossy())
                    .cwd(&layout.relay_dir))
            }
            ServiceKind::Analyzer => {
                require(&layout.analyzer_script, Prerequisite::AnalyzerScript)?;
                require(&layout.analyzer_model, Prerequisite::AnalyzerModel)?;
                require(&layout.analyzer_python, Prerequisite::Interpreter)?;

                let cwd = layout.analyzer_cwd.to_string_lossy().into_owned();
                let args = config.launch_args(
                    &layout.analyzer_script.to_string_lossy(),
                    &layout.analyzer_model.to_string_lossy(),
                    &self.options.endpoints,
                );
                debug!(kind = %kind, args = %args.join(" "), "analyzer arguments");
                Ok(LaunchSpec::new(kind.process_kind(), &layout.analyzer_python)
                    .args(args)
                    .cwd(&layout.analyzer_cwd)
                    .env("PYTHONPATH", cwd)
                    .env("PYTHONUNBUFFERED", "1"))
            }
        }
    }

    /// Record a failed attempt and publish it. Returns the error for the caller.
    ///
    /// A process still shutting down keeps the slot in `Stopping`; its exit
    /// hook completes the transition.
    fn fail_attempt(&self, kind: ServiceKind, attempt: u64, err: ServiceError) -> ServiceError {
        let message = err.to_string();
        warn!(kind = %kind, error = %message, "service failed to start");
        {
            let mut slots = self.lock();
            let slot = slots.entry(kind).or_default();
            if slot.attempt == attempt {
                if slot.pending_stop().is_none() {
                    slot.state = ServiceState::Stopped;
                    slot.handle = None;
                }
                slot.last_error = Some(message.clone());
            }
        }
        self.emitter
            .emit(StatusEvent::failed(kind.process_kind(), message));
        err
    }

    fn spawn_hook(&self, kind: ServiceKind, attempt: u64) -> SpawnHook {
        let slots = Arc::clone(&self.slots);
        let emitter = Arc::clone(&self.emitter);
        let supervisor = Arc::clone(&self.supervisor);
        Box::new(move |handle: &ProcessHandle| {
            let accepted = {
                let mut slots = lock_slots(&slots);
                let slot = slots.entry(kind).or_default();
                let accepted = slot.attempt == attempt && slot.state == ServiceState::Starting;
                if accepted {
                    slot.state = ServiceState::Running;
                    slot.handle = Some(handle.clone());
                }
                accepted
            };

            if accepted {
                emitter.emit(StatusEvent::running(kind.process_kind(), handle.pid()));
            } else {
                // Stopped while the spawn was in flight
                debug!(kind = %kind, pid = handle.pid(), "start was cancelled; stopping");
                supervisor.stop_handle(handle);
            }
        })
    }

    fn exit_hook(&self, kind: ServiceKind, attempt: u64) -> ExitHook {
        let slots = Arc::clone(&self.slots);
        Box::new(move |report: &ExitReport| {
            let mut slots = lock_slots(&slots);
            let slot = slots.entry(kind).or_default();
            let owns_attempt = slot.attempt == attempt;
            let holds_process = slot
                .handle
                .as_ref()
                .is_some_and(|h| h.generation() == report.generation);
            if !owns_attempt && !holds_process {
                return;
            }
            slot.handle = None;
            // A newer attempt that is still starting keeps its state
            if owns_attempt || slot.state == ServiceState::Stopping {
                slot.state = ServiceState::Stopped;
            }
            if owns_attempt && report.is_error() {
                slot.last_error = Some(report.status_message());
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ServiceKind, ServiceSlot>> {
        lock_slots(&self.slots)
    }
}

impl std::fmt::Debug for ServiceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOrchestrator")
            .field("layout", &self.layout)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn lock_slots(slots: &Mutex<HashMap<ServiceKind, ServiceSlot>>) -> MutexGuard<'_, HashMap<ServiceKind, ServiceSlot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

fn require(path: &Path, prerequisite: Prerequisite) -> Result<(), ServiceError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ServiceError::PrerequisiteMissing {
            prerequisite,
            path: path.to_path_buf(),
        })
    }
}

/// Write the default relay config if none exists yet.
fn ensure_relay_config(path: &Path) -> Result<(), ServiceError> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, DEFAULT_RELAY_CONFIG).map_err(|e| ServiceError::ConfigWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), "wrote default relay config");
    Ok(())
}
