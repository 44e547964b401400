//! TCP reachability probe for stream URLs.
//!
//! Only checks that something accepts a connection on the URL's host and
//! port; no protocol handshake is attempted.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// Port used when the URL does not name one explicitly (RTSP).
pub const DEFAULT_PROBE_PORT: u16 = 554;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Outcome of one probe. Connection failures are a report, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub success: bool,
    pub message: String,
}

/// Try to open a TCP connection to the host and port named by `url`.
pub async fn probe_stream(url: &str, timeout: Duration) -> Result<ProbeReport, ProbeError> {
    let (host, port) = target(url)?;
    debug!(%host, port, "probing stream endpoint");

    let report = match tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await
    {
        Ok(Ok(_stream)) => ProbeReport {
            success: true,
            message: "Connection successful".to_string(),
        },
        Ok(Err(e)) => ProbeReport {
            success: false,
            message: format!("Connection failed: {e}"),
        },
        Err(_) => ProbeReport {
            success: false,
            message: "Connection timeout".to_string(),
        },
    };
    Ok(report)
}

fn target(url: &str) -> Result<(String, u16), ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ProbeError::MissingHost(url.to_string()))?;
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
    Ok((host, parsed.port().unwrap_or(DEFAULT_PROBE_PORT)))
}
