//! Periodic and on-demand license checks.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use narada_core::settings::INITIAL_LICENSE_CHECK_DELAY_MS;
use narada_core::{
    LicenseGate, LicensePayload, LicenseState, LicenseVerdict, ProcessKind, ServiceKind, Settings,
    StatusEmitter, StatusEvent,
};
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::parse::{ParseError, parse_checker_output};
use crate::process::{ChildProcessSupervisor, LaunchSpec, OutputMode, SupervisorError};
use crate::services::ServiceOrchestrator;

/// Why a check produced no verdict from the checker itself. Every variant
/// except `Interrupted` is turned into an invalid verdict carrying this
/// message.
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("License checker not found: {}", .0.display())]
    ScriptMissing(PathBuf),

    #[error("Python interpreter not found: {}", .0.display())]
    InterpreterMissing(PathBuf),

    #[error("Failed to start license checker: {0}")]
    Spawn(String),

    #[error("License check timed out after {0:?}")]
    TimedOut(Duration),

    #[error("License check was interrupted")]
    Interrupted,

    #[error("Error checking license: {0}")]
    Parse(#[from] ParseError),
}

impl From<SupervisorError> for LicenseError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::NotFound { path, .. } => Self::InterpreterMissing(path),
            SupervisorError::SpawnFailed { reason, .. } => Self::Spawn(reason),
            SupervisorError::Timeout { after, .. } => Self::TimedOut(after),
            SupervisorError::Interrupted { .. } => Self::Interrupted,
        }
    }
}

/// Shared last-known license state.
///
/// Each check takes a ticket when it starts; a result is only stored if no
/// later-started check has stored one already.
#[derive(Debug, Default)]
pub struct LicenseCell {
    inner: RwLock<(u64, LicenseState)>,
}

impl LicenseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> LicenseState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .1
            .clone()
    }

    fn store(&self, ticket: u64, state: LicenseState) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if ticket < inner.0 {
            return false;
        }
        *inner = (ticket, state);
        true
    }
}

impl LicenseGate for LicenseCell {
    fn license_state(&self) -> LicenseState {
        self.get()
    }
}

/// Interpreter and script used to run the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerCommand {
    /// Interpreter path, or a bare command resolved on `PATH`.
    pub interpreter: PathBuf,
    pub script: PathBuf,
}

/// When scheduled checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl CheckSchedule {
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            initial_delay: Duration::from_millis(INITIAL_LICENSE_CHECK_DELAY_MS),
            interval: settings.effective_license_check_interval(),
        }
    }
}

/// Runs the checker and keeps the retained [`LicenseState`] current.
pub struct LicenseReconciler {
    supervisor: Arc<ChildProcessSupervisor>,
    emitter: Arc<dyn StatusEmitter>,
    cell: Arc<LicenseCell>,
    checker: CheckerCommand,
    timeout: Option<Duration>,
    tickets: AtomicU64,
}

impl LicenseReconciler {
    pub fn new(
        supervisor: Arc<ChildProcessSupervisor>,
        emitter: Arc<dyn StatusEmitter>,
        cell: Arc<LicenseCell>,
        checker: CheckerCommand,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            supervisor,
            emitter,
            cell,
            checker,
            timeout,
            tickets: AtomicU64::new(0),
        }
    }

    pub fn cell(&self) -> Arc<LicenseCell> {
        Arc::clone(&self.cell)
    }

    pub fn last_state(&self) -> LicenseState {
        self.cell.get()
    }

    /// Run the checker once and return the resulting state.
    ///
    /// Never fails: any problem becomes an invalid verdict with the cause as
    /// its message. Every stored verdict is published as a `licenseStatus`
    /// event. A check that is superseded or stopped stores nothing and
    /// returns the retained state.
    pub async fn check_once(&self) -> LicenseState {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(ticket, "license check started");

        let verdict = match self.run_checker().await {
            Ok(payload) => LicenseVerdict::from_payload(payload, Utc::now()),
            Err(LicenseError::Interrupted) => {
                debug!(ticket, "license check interrupted; keeping previous state");
                return self.cell.get();
            }
            Err(e) => {
                warn!(ticket, error = %e, "license check failed");
                LicenseVerdict::invalid(e.to_string(), Utc::now())
            }
        };

        let state = LicenseState::Checked(verdict.clone());
        if !self.cell.store(ticket, state.clone()) {
            debug!(ticket, "a newer license check already completed");
            return self.cell.get();
        }

        info!(valid = verdict.valid, message = %verdict.message, "license state updated");
        self.emitter.emit(StatusEvent::LicenseStatus { verdict });
        state
    }

    async fn run_checker(&self) -> Result<LicensePayload, LicenseError> {
        let script = &self.checker.script;
        if !script.is_file() {
            return Err(LicenseError::ScriptMissing(script.clone()));
        }

        let spec = LaunchSpec::new(ProcessKind::LicenseCheck, &self.checker.interpreter)
            .arg(script.to_string_lossy())
            .env("PYTHONUNBUFFERED", "1")
            .output(OutputMode::Capture);

        let report = self.supervisor.run_to_completion(spec, self.timeout).await?;
        debug!(code = ?report.code, bytes = report.stdout.len(), "license checker exited");
        Ok(parse_checker_output(&report.stdout)?)
    }

    /// Scheduled checks until `cancel` fires.
    ///
    /// Checks run one after another on this task, so scheduled checks never
    /// overlap; a tick that falls due during a slow check is delayed. After
    /// each valid result the relay is asked to be running, which is a no-op
    /// when it already is.
    pub async fn run_periodic(
        &self,
        orchestrator: &ServiceOrchestrator,
        schedule: CheckSchedule,
        cancel: CancellationToken,
    ) {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(schedule.initial_delay) => {}
        }

        let mut ticker = tokio::time::interval(schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let state = tokio::select! {
                () = cancel.cancelled() => break,
                state = self.check_once() => state,
            };

            if state.is_valid() {
                if let Err(e) = orchestrator.ensure_started(ServiceKind::Relay, None) {
                    warn!(error = %e, "relay not started after license check");
                }
            }
        }

        debug!("periodic license checks stopped");
    }
}

impl std::fmt::Debug for LicenseReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseReconciler")
            .field("checker", &self.checker)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(valid: bool) -> LicenseState {
        LicenseState::Checked(LicenseVerdict {
            valid,
            message: String::new(),
            drive: None,
            data: None,
            checked_at: Utc::now(),
        })
    }

    #[test]
    fn cell_rejects_results_from_older_checks() {
        let cell = LicenseCell::new();
        assert!(cell.get().is_unchecked());

        assert!(cell.store(2, state(true)));
        assert!(!cell.store(1, state(false)));
        assert!(cell.is_licensed());
    }

    #[test]
    fn supervisor_errors_map_to_license_errors() {
        let err: LicenseError = SupervisorError::Timeout {
            kind: ProcessKind::LicenseCheck,
            after: Duration::from_secs(3),
        }
        .into();
        assert_eq!(err.to_string(), "License check timed out after 3s");

        let err: LicenseError = SupervisorError::NotFound {
            kind: ProcessKind::LicenseCheck,
            path: PathBuf::from("python"),
        }
        .into();
        assert!(matches!(err, LicenseError::InterpreterMissing(_)));
    }

    #[test]
    fn parse_errors_carry_prefix() {
        let err = LicenseError::from(ParseError::NoPayload);
        assert_eq!(
            err.to_string(),
            "Error checking license: no JSON object in checker output"
        );
    }
}
