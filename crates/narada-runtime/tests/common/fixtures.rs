//! Fake collaborator programs written into a temp dir.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use narada_core::{LicenseState, LicenseVerdict, ServiceLayout, StaticLicenseGate};

/// Relay stand-in: stays up until signalled.
pub const LONG_RUNNING: &str = "exec sleep 30";

/// Write an executable `/bin/sh` script at `path`.
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// Executable script `name` directly under `dir`.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    write_script(&dir.join(name), body)
}

/// Plain file with `contents`, creating parents.
pub fn touch(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Layout under `root` with only the relay installed.
pub fn relay_layout(root: &Path, relay_body: &str) -> ServiceLayout {
    let layout = ServiceLayout::under(root);
    write_script(&layout.relay_exe, relay_body);
    layout
}

/// Layout under `root` with the relay and every analyzer prerequisite
/// installed. `python_body` runs in place of the analyzer interpreter.
pub fn full_layout(root: &Path, python_body: &str) -> ServiceLayout {
    let layout = relay_layout(root, LONG_RUNNING);
    touch(&layout.analyzer_script, "# analyzer\n");
    touch(&layout.analyzer_model, "weights");
    write_script(&layout.analyzer_python, python_body);
    layout
}

pub fn licensed() -> StaticLicenseGate {
    StaticLicenseGate(LicenseState::Checked(LicenseVerdict {
        valid: true,
        message: "ok".to_string(),
        drive: Some("E".to_string()),
        data: None,
        checked_at: Utc::now(),
    }))
}

pub fn unlicensed() -> StaticLicenseGate {
    StaticLicenseGate(LicenseState::Unchecked)
}

/// Poll `condition` every 20 ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
