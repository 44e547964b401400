//! License verdicts reported by the external checker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured license details, when the checker provides them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Expiry timestamp, as printed by the checker (ISO 8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    /// Hardware identifier the license is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
}

/// The JSON object printed by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Drive (or mount point) holding the license file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LicenseData>,
}

/// Result of one completed license check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseVerdict {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<LicenseData>,
    pub checked_at: DateTime<Utc>,
}

impl LicenseVerdict {
    /// Build a verdict from a parsed checker payload.
    pub fn from_payload(payload: LicensePayload, checked_at: DateTime<Utc>) -> Self {
        Self {
            valid: payload.valid,
            message: payload.message.unwrap_or_default(),
            drive: payload.drive,
            data: payload.data,
            checked_at,
        }
    }

    /// An explicit invalid verdict carrying the failure cause.
    pub fn invalid(message: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            drive: None,
            data: None,
            checked_at,
        }
    }
}

/// Last-known license state.
///
/// `Unchecked` (no check has completed yet) is deliberately a separate state
/// from an invalid verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LicenseState {
    #[default]
    Unchecked,
    Checked(LicenseVerdict),
}

impl LicenseState {
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Checked(verdict) if verdict.valid)
    }

    pub const fn is_unchecked(&self) -> bool {
        matches!(self, Self::Unchecked)
    }

    pub const fn verdict(&self) -> Option<&LicenseVerdict> {
        match self {
            Self::Checked(verdict) => Some(verdict),
            Self::Unchecked => None,
        }
    }
}
