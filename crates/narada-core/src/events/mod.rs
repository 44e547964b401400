//! Status events pushed from supervised processes to subscribers.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag so UI listeners can switch on it:
//!
//! ```json
//! { "type": "serviceStatus", "kind": "relay", "running": true, "message": "Running", "error": false }
//! ```

mod bus;

use serde::{Deserialize, Serialize};

use crate::domain::{LicenseVerdict, ProcessKind};

pub use bus::{StatusEventBus, SubscriptionId};

/// Severity of a forwarded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Coarse event category used for topic subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    ServiceStatus,
    ServiceStats,
    LogLine,
    LicenseStatus,
}

/// A typed notification about a supervised process or the license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StatusEvent {
    /// A service started, stopped, exited or failed to start.
    ServiceStatus {
        kind: ProcessKind,
        running: bool,
        message: String,
        error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },

    /// Throughput counters reported by the analyzer.
    ServiceStats {
        kind: ProcessKind,
        count: f64,
        fps: f64,
        mode: String,
    },

    /// One line of collaborator output.
    LogLine {
        kind: ProcessKind,
        severity: Severity,
        text: String,
    },

    /// Result of a completed license check.
    LicenseStatus { verdict: LicenseVerdict },
}

impl StatusEvent {
    pub fn running(kind: ProcessKind, pid: u32) -> Self {
        Self::ServiceStatus {
            kind,
            running: true,
            message: "Running".to_string(),
            error: false,
            pid: Some(pid),
        }
    }

    /// A `running=false` status with no error.
    pub fn stopped(kind: ProcessKind, message: impl Into<String>) -> Self {
        Self::ServiceStatus {
            kind,
            running: false,
            message: message.into(),
            error: false,
            pid: None,
        }
    }

    /// A `running=false` status flagged as an error.
    pub fn failed(kind: ProcessKind, message: impl Into<String>) -> Self {
        Self::ServiceStatus {
            kind,
            running: false,
            message: message.into(),
            error: true,
            pid: None,
        }
    }

    pub fn log(kind: ProcessKind, severity: Severity, text: impl Into<String>) -> Self {
        Self::LogLine {
            kind,
            severity,
            text: text.into(),
        }
    }

    /// Get the event name for wire protocols.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ServiceStatus { .. } => "service:status",
            Self::ServiceStats { .. } => "service:stats",
            Self::LogLine { .. } => "log:line",
            Self::LicenseStatus { .. } => "license:status",
        }
    }

    pub const fn topic(&self) -> EventTopic {
        match self {
            Self::ServiceStatus { .. } => EventTopic::ServiceStatus,
            Self::ServiceStats { .. } => EventTopic::ServiceStats,
            Self::LogLine { .. } => EventTopic::LogLine,
            Self::LicenseStatus { .. } => EventTopic::LicenseStatus,
        }
    }

    /// Process kind the event concerns, if any.
    pub const fn kind(&self) -> Option<ProcessKind> {
        match self {
            Self::ServiceStatus { kind, .. }
            | Self::ServiceStats { kind, .. }
            | Self::LogLine { kind, .. } => Some(*kind),
            Self::LicenseStatus { .. } => None,
        }
    }
}
