//! Identity of the external processes the shell supervises.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of external process the supervisor knows how to run.
///
/// At most one live OS process exists per kind at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// Media relay republishing ingested video (RTSP/RTMP/HLS/WebRTC).
    Relay,
    /// One-shot license checker printing a JSON verdict.
    LicenseCheck,
    /// Crowd-counting analyzer consuming the relay feed.
    Analyzer,
}

impl ProcessKind {
    /// All process kinds, in a stable order.
    pub const ALL: [Self; 3] = [Self::Relay, Self::LicenseCheck, Self::Analyzer];

    /// Stable lowercase identifier used in logs and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::LicenseCheck => "license_check",
            Self::Analyzer => "analyzer",
        }
    }

    /// Human-facing label used in status messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relay => "Relay",
            Self::LicenseCheck => "License checker",
            Self::Analyzer => "Analyzer",
        }
    }

    /// The long-running service this process backs, if any.
    pub const fn service(self) -> Option<ServiceKind> {
        match self {
            Self::Relay => Some(ServiceKind::Relay),
            Self::Analyzer => Some(ServiceKind::Analyzer),
            Self::LicenseCheck => None,
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The long-running services managed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Relay,
    Analyzer,
}

impl ServiceKind {
    pub const ALL: [Self; 2] = [Self::Relay, Self::Analyzer];

    pub const fn process_kind(self) -> ProcessKind {
        match self {
            Self::Relay => ProcessKind::Relay,
            Self::Analyzer => ProcessKind::Analyzer,
        }
    }

    pub const fn label(self) -> &'static str {
        self.process_kind().label()
    }
}

impl From<ServiceKind> for ProcessKind {
    fn from(kind: ServiceKind) -> Self {
        kind.process_kind()
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.process_kind().as_str())
    }
}
