//! One-line renderings of status events and service state.

use narada_core::{LicenseState, LicenseVerdict, Severity, StatusEvent};
use narada_runtime::ServiceSnapshot;

use super::tables::format_optional;

/// Render an event as a single terminal line.
pub fn render_event(event: &StatusEvent) -> String {
    match event {
        StatusEvent::ServiceStatus {
            kind,
            running,
            message,
            error,
            pid,
        } => {
            let marker = match (running, error) {
                (true, _) => "up",
                (false, false) => "down",
                (false, true) => "FAIL",
            };
            match pid {
                Some(pid) => format!("[{kind}] {marker}: {message} (pid {pid})"),
                None => format!("[{kind}] {marker}: {message}"),
            }
        }
        StatusEvent::ServiceStats {
            kind,
            count,
            fps,
            mode,
        } => format!("[{kind}] count={count:.0} fps={fps:.1} mode={mode}"),
        StatusEvent::LogLine {
            kind,
            severity,
            text,
        } => match severity {
            Severity::Info => format!("[{kind}] {text}"),
            other => format!("[{kind}] {}: {text}", other.as_str()),
        },
        StatusEvent::LicenseStatus { verdict } => format!("[license] {}", render_verdict(verdict)),
    }
}

pub fn render_verdict(verdict: &LicenseVerdict) -> String {
    let mut line = if verdict.valid {
        "valid".to_string()
    } else {
        "INVALID".to_string()
    };
    if !verdict.message.is_empty() {
        line.push_str(": ");
        line.push_str(&verdict.message);
    }
    if let Some(drive) = &verdict.drive {
        line.push_str(&format!(" (drive {drive})"));
    }
    line
}

/// Multi-line service summary for the `status` console command.
pub fn render_snapshot(snapshot: &ServiceSnapshot) -> String {
    let mut out = format!(
        "{:<9} {:<9} pid={}",
        snapshot.kind.label(),
        format!("{:?}", snapshot.state).to_lowercase(),
        format_optional(snapshot.pid, "-"),
    );
    if let Some(code) = snapshot.last_exit_code {
        out.push_str(&format!(" last_exit={code}"));
    }
    if let Some(error) = &snapshot.last_error {
        out.push_str(&format!("\n          last error: {error}"));
    }
    out
}

/// Short description of the retained license state.
pub fn render_license_state(state: &LicenseState) -> String {
    state
        .verdict()
        .map_or_else(|| "not checked yet".to_string(), render_verdict)
}
