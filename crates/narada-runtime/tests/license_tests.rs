//! License checks through a fake checker script run by `/bin/sh`.

#![cfg(unix)]

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{LONG_RUNNING, relay_layout, touch, wait_until};
use common::recorder::Recorder;
use narada_core::{AnalyzerEndpoints, ServiceKind, StatusEventBus};
use narada_runtime::{
    CheckSchedule, CheckerCommand, ChildProcessSupervisor, LicenseCell, LicenseReconciler,
    OrchestratorOptions, ServiceOrchestrator,
};
use tokio_util::sync::CancellationToken;

struct Harness {
    bus: Arc<StatusEventBus>,
    recorder: Recorder,
    supervisor: Arc<ChildProcessSupervisor>,
    cell: Arc<LicenseCell>,
    reconciler: Arc<LicenseReconciler>,
}

fn harness(script: &Path, timeout: Option<Duration>) -> Harness {
    let bus = Arc::new(StatusEventBus::new());
    let recorder = Recorder::attach(&bus);
    let supervisor = Arc::new(ChildProcessSupervisor::new(
        bus.clone(),
        Duration::from_secs(2),
    ));
    let cell = Arc::new(LicenseCell::new());
    let checker = CheckerCommand {
        interpreter: PathBuf::from("/bin/sh"),
        script: script.to_path_buf(),
    };
    let reconciler = Arc::new(LicenseReconciler::new(
        Arc::clone(&supervisor),
        bus.clone(),
        Arc::clone(&cell),
        checker,
        timeout,
    ));
    Harness {
        bus,
        recorder,
        supervisor,
        cell,
        reconciler,
    }
}

fn checker_printing(dir: &Path, output: &str) -> PathBuf {
    let path = dir.join("license-checker.py");
    touch(&path, &format!("printf '%s' '{output}'\n"));
    path
}

#[tokio::test]
async fn banner_before_payload_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let script = checker_printing(dir.path(), "booting...\n{\"valid\":true,\"drive\":\"E\"}\n");
    let h = harness(&script, None);
    assert!(h.reconciler.last_state().is_unchecked());

    let state = h.reconciler.check_once().await;

    assert!(state.is_valid());
    let verdict = state.verdict().unwrap();
    assert_eq!(verdict.drive.as_deref(), Some("E"));
    assert_eq!(h.reconciler.last_state(), state);
    assert_eq!(h.recorder.verdicts(), vec![verdict.clone()]);
}

#[tokio::test]
async fn unparseable_output_is_an_invalid_state() {
    let dir = tempfile::tempdir().unwrap();
    let script = checker_printing(dir.path(), "Traceback: something broke");
    let h = harness(&script, None);

    let state = h.reconciler.check_once().await;

    assert!(!state.is_valid());
    assert!(!state.is_unchecked());
    let message = &state.verdict().unwrap().message;
    assert!(message.starts_with("Error checking license"), "{message}");
    assert_eq!(h.recorder.verdicts().len(), 1);
}

#[tokio::test]
async fn invalid_verdict_replaces_valid_one_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let script = checker_printing(dir.path(), "{\"valid\":true,\"drive\":\"E\"}");
    let h = harness(&script, None);
    assert!(h.reconciler.check_once().await.is_valid());

    touch(&script, "printf '%s' '{\"valid\":false,\"message\":\"expired\"}'\n");
    let state = h.reconciler.check_once().await;

    let verdict = state.verdict().unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.message, "expired");
    assert_eq!(verdict.drive, None);
}

#[tokio::test]
async fn missing_checker_script_is_an_invalid_state() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&dir.path().join("absent.py"), None);

    let state = h.reconciler.check_once().await;

    assert!(!state.is_valid());
    assert!(state.verdict().unwrap().message.contains("absent.py"));
}

#[tokio::test]
async fn hung_checker_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("license-checker.py");
    touch(&script, &format!("{LONG_RUNNING}\n"));
    let h = harness(&script, Some(Duration::from_millis(300)));

    let state = h.reconciler.check_once().await;

    assert!(!state.is_valid());
    assert!(state.verdict().unwrap().message.contains("timed out"));
    assert!(!h.supervisor.is_running(narada_core::ProcessKind::LicenseCheck));
}

#[tokio::test]
async fn valid_scheduled_check_starts_the_relay() {
    let dir = tempfile::tempdir().unwrap();
    let script = checker_printing(dir.path(), "{\"valid\":true}");
    let h = harness(&script, None);

    let layout = relay_layout(&dir.path().join("resources"), LONG_RUNNING);
    let orchestrator = Arc::new(ServiceOrchestrator::new(
        Arc::clone(&h.supervisor),
        h.cell.clone(),
        h.bus.clone(),
        layout,
        OrchestratorOptions {
            endpoints: AnalyzerEndpoints {
                source: "rtmp://localhost:1935/drone".to_string(),
                stream_out: "rtmp://localhost:1935/live".to_string(),
            },
            settle: Duration::from_millis(10),
        },
    ));

    let schedule = CheckSchedule {
        initial_delay: Duration::from_millis(10),
        interval: Duration::from_secs(3600),
    };
    let cancel = CancellationToken::new();
    let task = {
        let reconciler = Arc::clone(&h.reconciler);
        let orchestrator = Arc::clone(&orchestrator);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            reconciler.run_periodic(&orchestrator, schedule, cancel).await;
        })
    };

    assert!(
        wait_until(Duration::from_secs(5), || {
            orchestrator.get_status(ServiceKind::Relay).running
        })
        .await
    );
    assert!(h.cell.get().is_valid());

    cancel.cancel();
    task.await.unwrap();
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn cancelled_schedule_never_checks() {
    let dir = tempfile::tempdir().unwrap();
    let script = checker_printing(dir.path(), "{\"valid\":true}");
    let h = harness(&script, None);
    let orchestrator = ServiceOrchestrator::new(
        Arc::clone(&h.supervisor),
        h.cell.clone(),
        h.bus.clone(),
        narada_core::ServiceLayout::under(dir.path()),
        OrchestratorOptions {
            endpoints: AnalyzerEndpoints {
                source: "rtmp://localhost:1935/drone".to_string(),
                stream_out: "rtmp://localhost:1935/live".to_string(),
            },
            settle: Duration::from_millis(10),
        },
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let schedule = CheckSchedule {
        initial_delay: Duration::from_millis(10),
        interval: Duration::from_millis(10),
    };
    h.reconciler.run_periodic(&orchestrator, schedule, cancel).await;

    assert!(h.cell.get().is_unchecked());
    assert!(h.recorder.verdicts().is_empty());
}
