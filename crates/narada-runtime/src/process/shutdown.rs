//! Termination of a supervised child.
//!
//! - Unix: SIGTERM, a grace period, then SIGKILL
//! - Windows: forced tree kill straight away; the collaborators do not
//!   reliably honour a graceful request there

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

/// Stop `child` and reap it.
pub async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        terminate_windows(child).await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|p| i32::try_from(p).ok()) else {
        // Already reaped
        return child.wait().await;
    };

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = tokio::time::timeout(grace, child.wait()).await {
        return result;
    }

    debug!(pid = %pid, grace_ms = grace.as_millis(), "grace period elapsed, killing");
    child.kill().await?;
    child.wait().await
}

#[cfg(not(unix))]
async fn terminate_windows(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(pid) = child.id() {
        let status = tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;
        match status {
            Ok(s) if s.success() => return child.wait().await,
            Ok(s) => debug!(pid = %pid, code = ?s.code(), "taskkill failed, falling back to kill"),
            Err(e) => debug!(pid = %pid, error = %e, "taskkill unavailable, falling back to kill"),
        }
    }
    child.kill().await?;
    child.wait().await
}
