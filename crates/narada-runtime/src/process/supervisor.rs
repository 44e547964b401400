//! Lifecycle management for the external processes, one slot per kind.
//!
//! The supervisor owns its state internally; callers hold cheap
//! [`ProcessHandle`]s and never the OS child itself. Each spawned child gets a
//! watcher task that waits for exit (or a stop request), drains the output
//! readers, clears the slot, runs the caller's exit hook and publishes the
//! final `serviceStatus`.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use narada_core::{ProcessKind, StatusEmitter, StatusEvent};
use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::decoder::LineProtocolDecoder;
use super::error::SupervisorError;
use super::liveness::pid_exists;
use super::shutdown::terminate;
use super::spec::{LaunchSpec, OutputMode};
use super::stream::{spawn_capture_reader, spawn_event_reader};

/// Upper bound on waiting for output readers after the child has exited.
/// A grandchild can keep the pipes open indefinitely.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Callback run right after a successful spawn, before the exit watcher
/// exists. Anything it publishes is ordered before the exit status.
pub type SpawnHook = Box<dyn FnOnce(&ProcessHandle) + Send + 'static>;

/// Callback run by the watcher once the child has exited and its slot has
/// been cleared, before the exit status is published.
pub type ExitHook = Box<dyn FnOnce(&ExitReport) + Send + 'static>;

/// Optional lifecycle callbacks for one `start`.
#[derive(Default)]
pub struct ProcessHooks {
    pub on_spawn: Option<SpawnHook>,
    pub on_exit: Option<ExitHook>,
}

impl ProcessHooks {
    pub fn none() -> Self {
        Self::default()
    }
}

type ExitWatch = watch::Receiver<Option<Arc<ExitReport>>>;

/// Why a process was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An explicit `stop`.
    Requested,
    /// A new process of the same kind replaced it.
    Superseded,
}

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub kind: ProcessKind,
    pub pid: u32,
    /// Matches [`ProcessHandle::generation`] of the exited process.
    pub generation: u64,
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Set when the exit followed a stop request.
    pub stopped: Option<StopReason>,
    /// Set when waiting on the child failed.
    pub wait_error: Option<String>,
    /// Captured stdout for [`OutputMode::Capture`]; empty otherwise.
    pub stdout: String,
}

impl ExitReport {
    pub const fn was_stopped(&self) -> bool {
        self.stopped.is_some()
    }

    pub const fn was_superseded(&self) -> bool {
        matches!(self.stopped, Some(StopReason::Superseded))
    }

    /// An unrequested exit other than a clean `0`.
    pub fn is_error(&self) -> bool {
        self.stopped.is_none() && (self.wait_error.is_some() || self.code != Some(0))
    }

    pub fn status_message(&self) -> String {
        if self.stopped.is_some() {
            return "Stopped".to_string();
        }
        if let Some(err) = &self.wait_error {
            return format!("Lost track of process: {err}");
        }
        match self.code {
            Some(0) => "Stopped".to_string(),
            Some(code) => format!("Exited with code {code}"),
            None => "Terminated by signal".to_string(),
        }
    }

    /// The `running=false` status this exit maps to.
    pub fn status_event(&self) -> StatusEvent {
        if self.is_error() {
            StatusEvent::failed(self.kind, self.status_message())
        } else {
            StatusEvent::stopped(self.kind, self.status_message())
        }
    }
}

/// Reference to one spawned process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    kind: ProcessKind,
    pid: u32,
    generation: u64,
    exit: ExitWatch,
}

impl ProcessHandle {
    pub const fn kind(&self) -> ProcessKind {
        self.kind
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Monotonic spawn counter; distinguishes successive processes of a kind.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_exited(&self) -> bool {
        self.exit.borrow().is_some()
    }

    pub fn exit_report(&self) -> Option<Arc<ExitReport>> {
        self.exit.borrow().clone()
    }

    /// Resolve once the watcher has finished with this process.
    pub async fn wait_exit(&self) -> Option<Arc<ExitReport>> {
        let mut rx = self.exit.clone();
        let report = rx.wait_for(Option::is_some).await.ok()?;
        (*report).clone()
    }
}

struct Slot {
    generation: u64,
    pid: u32,
    stop_tx: oneshot::Sender<StopReason>,
    exit: ExitWatch,
}

impl Slot {
    fn handle(&self, kind: ProcessKind) -> ProcessHandle {
        ProcessHandle {
            kind,
            pid: self.pid,
            generation: self.generation,
            exit: self.exit.clone(),
        }
    }
}

#[derive(Default)]
struct ProcessTable {
    slots: HashMap<ProcessKind, Slot>,
    last_exit: HashMap<ProcessKind, Option<i32>>,
}

enum StdoutReader {
    Events(JoinHandle<()>),
    Capture(JoinHandle<String>),
}

/// Spawns, stops and observes the external processes.
///
/// At most one live handle exists per [`ProcessKind`]: starting a kind that
/// is already running stops the previous process first.
pub struct ChildProcessSupervisor {
    table: Arc<Mutex<ProcessTable>>,
    generation: AtomicU64,
    stop_grace: Duration,
    emitter: Arc<dyn StatusEmitter>,
}

impl ChildProcessSupervisor {
    pub fn new(emitter: Arc<dyn StatusEmitter>, stop_grace: Duration) -> Self {
        Self {
            table: Arc::new(Mutex::new(ProcessTable::default())),
            generation: AtomicU64::new(0),
            stop_grace,
            emitter,
        }
    }

    pub const fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    /// Spawn `spec`, superseding any live process of the same kind.
    ///
    /// The executable is checked before anything else; a missing one fails
    /// with [`SupervisorError::NotFound`] and leaves a running process of the
    /// same kind untouched. Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        spec: LaunchSpec,
        hooks: ProcessHooks,
    ) -> Result<ProcessHandle, SupervisorError> {
        let kind = spec.kind;
        let executable = resolve_executable(&spec)?;

        let mut table = self.lock();
        if let Some(previous) = take_slot(&mut table, kind, StopReason::Superseded) {
            info!(kind = %kind, pid = previous.pid, "superseding running process");
        }

        let mut child = spec.command(&executable).spawn().map_err(|e| {
            warn!(kind = %kind, program = %executable.display(), error = %e, "spawn failed");
            SupervisorError::SpawnFailed {
                kind,
                reason: e.to_string(),
            }
        })?;
        let Some(pid) = child.id() else {
            return Err(SupervisorError::SpawnFailed {
                kind,
                reason: "process exited before reporting a PID".to_string(),
            });
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let (stop_tx, stop_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        let slot = Slot {
            generation,
            pid,
            stop_tx,
            exit: exit_rx,
        };
        let handle = slot.handle(kind);
        table.slots.insert(kind, slot);
        drop(table);

        info!(kind = %kind, pid, generation, program = %executable.display(), "process started");
        if let Some(on_spawn) = hooks.on_spawn {
            on_spawn(&handle);
        }

        let stdout = stdout_pipe.map(|out| match spec.output {
            OutputMode::Protocol => StdoutReader::Events(spawn_event_reader(
                out,
                LineProtocolDecoder::stdout(kind),
                kind,
                Arc::clone(&self.emitter),
            )),
            OutputMode::Capture => StdoutReader::Capture(spawn_capture_reader(out, kind)),
        });
        let stderr = stderr_pipe.map(|err| {
            spawn_event_reader(
                err,
                LineProtocolDecoder::stderr(kind),
                kind,
                Arc::clone(&self.emitter),
            )
        });

        tokio::spawn(watch_child(Watch {
            kind,
            pid,
            generation,
            child,
            stop_rx,
            exit_tx,
            stdout,
            stderr,
            on_exit: hooks.on_exit,
            grace: self.stop_grace,
            table: Arc::clone(&self.table),
            emitter: Arc::clone(&self.emitter),
        }));

        Ok(handle)
    }

    /// Stop the live process of `kind`, if any.
    ///
    /// The slot is cleared before this returns, so an immediate `start` of
    /// the same kind is never blocked. Termination and the final status
    /// happen asynchronously; await [`ProcessHandle::wait_exit`] to observe
    /// them. No final status is published if the kind has been started
    /// again by the time the process exits.
    pub fn stop(&self, kind: ProcessKind) -> Option<ProcessHandle> {
        let handle = take_slot(&mut self.lock(), kind, StopReason::Requested);
        match &handle {
            Some(h) => info!(kind = %kind, pid = h.pid, "stop requested"),
            None => debug!(kind = %kind, "stop requested but nothing is running"),
        }
        handle
    }

    /// Stop `handle`'s process only if it is still the live one for its kind.
    pub fn stop_handle(&self, handle: &ProcessHandle) -> bool {
        let mut table = self.lock();
        let current = table
            .slots
            .get(&handle.kind)
            .is_some_and(|s| s.generation == handle.generation);
        if current {
            take_slot(&mut table, handle.kind, StopReason::Requested);
        }
        current
    }

    /// Request a stop for every live process.
    pub fn stop_all(&self) -> Vec<ProcessHandle> {
        let mut table = self.lock();
        ProcessKind::ALL
            .into_iter()
            .filter_map(|kind| take_slot(&mut table, kind, StopReason::Requested))
            .collect()
    }

    /// Stop everything and wait (bounded) for each process to be reaped.
    pub async fn shutdown(&self) {
        let bound = self.stop_grace + READER_DRAIN_TIMEOUT * 2;
        for handle in self.stop_all() {
            if tokio::time::timeout(bound, handle.wait_exit()).await.is_err() {
                warn!(kind = %handle.kind, pid = handle.pid, "process did not exit during shutdown");
            }
        }
    }

    pub fn current(&self, kind: ProcessKind) -> Option<ProcessHandle> {
        self.lock().slots.get(&kind).map(|slot| slot.handle(kind))
    }

    pub fn is_running(&self, kind: ProcessKind) -> bool {
        self.lock().slots.contains_key(&kind)
    }

    /// Probe the OS process table for `handle`'s process.
    ///
    /// Meant for explicit status queries; the running state itself is
    /// tracked through handle presence and the exit watcher.
    pub fn is_alive(&self, handle: &ProcessHandle) -> bool {
        !handle.has_exited() && pid_exists(handle.pid)
    }

    /// Exit code of the most recent non-superseded process of `kind`.
    pub fn last_exit_code(&self, kind: ProcessKind) -> Option<i32> {
        self.lock().last_exit.get(&kind).copied().flatten()
    }

    /// Spawn a one-shot process, capture its stdout and wait for it.
    ///
    /// With `limit` set, a process still running when it expires is stopped
    /// and [`SupervisorError::Timeout`] returned. A run that is stopped or
    /// superseded by someone else yields [`SupervisorError::Interrupted`].
    pub async fn run_to_completion(
        &self,
        spec: LaunchSpec,
        limit: Option<Duration>,
    ) -> Result<Arc<ExitReport>, SupervisorError> {
        let kind = spec.kind;
        let handle = self.start(spec.output(OutputMode::Capture), ProcessHooks::none())?;

        let report = match limit {
            None => handle.wait_exit().await,
            Some(limit) => {
                if let Ok(report) = tokio::time::timeout(limit, handle.wait_exit()).await {
                    report
                } else {
                    warn!(kind = %kind, pid = handle.pid, limit_ms = limit.as_millis(), "run timed out");
                    if self.stop_handle(&handle) {
                        let _ = handle.wait_exit().await;
                    }
                    return Err(SupervisorError::Timeout { kind, after: limit });
                }
            }
        };

        match report {
            Some(report) if !report.was_stopped() => Ok(report),
            _ => Err(SupervisorError::Interrupted { kind }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProcessTable> {
        lock_table(&self.table)
    }
}

impl std::fmt::Debug for ChildProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let running: Vec<ProcessKind> = self.lock().slots.keys().copied().collect();
        f.debug_struct("ChildProcessSupervisor")
            .field("running", &running)
            .field("stop_grace", &self.stop_grace)
            .finish_non_exhaustive()
    }
}

fn lock_table(table: &Mutex<ProcessTable>) -> MutexGuard<'_, ProcessTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remove the slot for `kind` and signal its watcher, under the table lock
/// so the watcher can always recover the reason.
fn take_slot(table: &mut ProcessTable, kind: ProcessKind, reason: StopReason) -> Option<ProcessHandle> {
    let slot = table.slots.remove(&kind)?;
    let handle = slot.handle(kind);
    // The watcher may already be past its select; it then reads the reason
    // back out of the channel.
    let _ = slot.stop_tx.send(reason);
    Some(handle)
}

/// Whether a process of `kind` spawned after `generation` holds the slot.
fn has_newer(table: &ProcessTable, kind: ProcessKind, generation: u64) -> bool {
    table.slots.get(&kind).is_some_and(|s| s.generation > generation)
}

fn resolve_executable(spec: &LaunchSpec) -> Result<PathBuf, SupervisorError> {
    let not_found = || SupervisorError::NotFound {
        kind: spec.kind,
        path: spec.program.clone(),
    };

    if spec.is_bare_command() {
        return which::which(&spec.program).map_err(|_| not_found());
    }
    if spec.program.is_file() {
        Ok(spec.program.clone())
    } else {
        Err(not_found())
    }
}

struct Watch {
    kind: ProcessKind,
    pid: u32,
    generation: u64,
    child: Child,
    stop_rx: oneshot::Receiver<StopReason>,
    exit_tx: watch::Sender<Option<Arc<ExitReport>>>,
    stdout: Option<StdoutReader>,
    stderr: Option<JoinHandle<()>>,
    on_exit: Option<ExitHook>,
    grace: Duration,
    table: Arc<Mutex<ProcessTable>>,
    emitter: Arc<dyn StatusEmitter>,
}

enum Waited {
    Exited(io::Result<ExitStatus>),
    StopRequested(StopReason),
}

async fn watch_child(mut w: Watch) {
    let waited = tokio::select! {
        status = w.child.wait() => Waited::Exited(status),
        reason = &mut w.stop_rx => Waited::StopRequested(reason.unwrap_or(StopReason::Requested)),
    };

    let (status, mut stopped) = match waited {
        Waited::Exited(status) => (status, None),
        Waited::StopRequested(reason) => {
            debug!(kind = %w.kind, pid = w.pid, ?reason, "terminating");
            (terminate(&mut w.child, w.grace).await, Some(reason))
        }
    };

    {
        let mut table = lock_table(&w.table);
        let current = table
            .slots
            .get(&w.kind)
            .is_some_and(|s| s.generation == w.generation);
        if current {
            table.slots.remove(&w.kind);
        } else if stopped.is_none() {
            // Exited on its own while a stop was being issued
            stopped = Some(w.stop_rx.try_recv().unwrap_or(StopReason::Requested));
        }
        if stopped != Some(StopReason::Superseded) && !has_newer(&table, w.kind, w.generation) {
            let code = status.as_ref().ok().and_then(ExitStatus::code);
            table.last_exit.insert(w.kind, code);
        }
    }

    let stdout = drain_readers(w.stdout.take(), w.stderr.take()).await;

    let report = match status {
        Ok(status) => ExitReport {
            kind: w.kind,
            pid: w.pid,
            generation: w.generation,
            code: status.code(),
            stopped,
            wait_error: None,
            stdout,
        },
        Err(e) => ExitReport {
            kind: w.kind,
            pid: w.pid,
            generation: w.generation,
            code: None,
            stopped,
            wait_error: Some(e.to_string()),
            stdout,
        },
    };

    if report.is_error() {
        warn!(kind = %w.kind, pid = w.pid, code = ?report.code, "process exited unexpectedly");
    } else {
        info!(kind = %w.kind, pid = w.pid, code = ?report.code, stopped = ?report.stopped, "process exited");
    }

    if let Some(hook) = w.on_exit.take() {
        hook(&report);
    }
    if w.kind.service().is_some() && !report.was_superseded() {
        // A stopped process whose kind has already been started again must
        // not overwrite the newer `running=true`.
        if report.was_stopped() && has_newer(&lock_table(&w.table), w.kind, w.generation) {
            debug!(kind = %w.kind, pid = w.pid, "newer process is live; exit status not published");
        } else {
            w.emitter.emit(report.status_event());
        }
    }
    w.exit_tx.send_replace(Some(Arc::new(report)));
}

async fn drain_readers(stdout: Option<StdoutReader>, stderr: Option<JoinHandle<()>>) -> String {
    let captured = match stdout {
        Some(StdoutReader::Events(task)) => {
            let _ = tokio::time::timeout(READER_DRAIN_TIMEOUT, task).await;
            String::new()
        }
        Some(StdoutReader::Capture(task)) => tokio::time::timeout(READER_DRAIN_TIMEOUT, task)
            .await
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default(),
        None => String::new(),
    };
    if let Some(task) = stderr {
        let _ = tokio::time::timeout(READER_DRAIN_TIMEOUT, task).await;
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(code: Option<i32>, stopped: Option<StopReason>) -> ExitReport {
        ExitReport {
            kind: ProcessKind::Relay,
            pid: 1,
            generation: 1,
            code,
            stopped,
            wait_error: None,
            stdout: String::new(),
        }
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let r = report(Some(2), None);
        assert!(r.is_error());
        assert_eq!(
            r.status_event(),
            StatusEvent::failed(ProcessKind::Relay, "Exited with code 2")
        );
    }

    #[test]
    fn requested_stop_is_not_an_error() {
        let r = report(None, Some(StopReason::Requested));
        assert!(!r.is_error());
        assert_eq!(r.status_event(), StatusEvent::stopped(ProcessKind::Relay, "Stopped"));
    }

    #[test]
    fn clean_exit_and_signal_death() {
        assert!(!report(Some(0), None).is_error());
        let killed = report(None, None);
        assert!(killed.is_error());
        assert_eq!(killed.status_message(), "Terminated by signal");
    }

    #[tokio::test]
    async fn missing_executable_is_not_found() {
        let supervisor =
            ChildProcessSupervisor::new(Arc::new(narada_core::NoopEmitter), Duration::from_secs(1));
        let spec = LaunchSpec::new(ProcessKind::Relay, "/nonexistent/narada/mediamtx");
        let err = supervisor.start(spec, ProcessHooks::none()).unwrap_err();
        assert!(matches!(err, SupervisorError::NotFound { kind: ProcessKind::Relay, .. }));
        assert!(!supervisor.is_running(ProcessKind::Relay));
    }
}
