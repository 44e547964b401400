//! Settings domain types and validation.
//!
//! All fields are optional; an absent field falls back to the matching
//! `DEFAULT_*` constant through its `effective_*` accessor.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Period between scheduled license checks.
pub const DEFAULT_LICENSE_CHECK_INTERVAL_SECS: u64 = 180;

/// Delay between stopping and restarting a service.
pub const DEFAULT_RESTART_SETTLE_MS: u64 = 1000;

/// Grace period between the termination signal and a forced kill.
pub const DEFAULT_STOP_GRACE_SECS: u64 = 5;

/// Delay before the first license check after startup.
pub const INITIAL_LICENSE_CHECK_DELAY_MS: u64 = 500;

pub const DEFAULT_ANALYZER_SOURCE_URL: &str = "rtmp://localhost:1935/drone";
pub const DEFAULT_ANALYZER_OUTPUT_URL: &str = "rtmp://localhost:1935/live";
pub const DEFAULT_HLS_BASE_URL: &str = "http://localhost:8888";
pub const DEFAULT_RTSP_BASE_URL: &str = "rtsp://localhost:8554";
pub const DEFAULT_RTMP_BASE_URL: &str = "rtmp://localhost:1935";

/// Interpreter used to run the license checker script.
pub const DEFAULT_LICENSE_PYTHON: &str = "python";

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub license_check_interval_secs: Option<u64>,

    pub restart_settle_ms: Option<u64>,

    pub stop_grace_secs: Option<u64>,

    /// Upper bound on one license check. Unbounded when absent.
    pub license_check_timeout_secs: Option<u64>,

    /// Feed the analyzer reads from.
    pub analyzer_source_url: Option<String>,

    /// Where the analyzer publishes its annotated stream.
    pub analyzer_output_url: Option<String>,

    pub hls_base_url: Option<String>,
    pub rtsp_base_url: Option<String>,
    pub rtmp_base_url: Option<String>,

    /// Interpreter command or path for the license checker.
    pub license_python: Option<String>,
}

impl Settings {
    #[must_use]
    pub const fn effective_license_check_interval(&self) -> Duration {
        match self.license_check_interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_LICENSE_CHECK_INTERVAL_SECS),
        }
    }

    #[must_use]
    pub const fn effective_restart_settle(&self) -> Duration {
        match self.restart_settle_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_RESTART_SETTLE_MS),
        }
    }

    #[must_use]
    pub const fn effective_stop_grace(&self) -> Duration {
        match self.stop_grace_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_STOP_GRACE_SECS),
        }
    }

    #[must_use]
    pub const fn license_check_timeout(&self) -> Option<Duration> {
        match self.license_check_timeout_secs {
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        }
    }

    pub fn effective_analyzer_source_url(&self) -> &str {
        self.analyzer_source_url
            .as_deref()
            .unwrap_or(DEFAULT_ANALYZER_SOURCE_URL)
    }

    pub fn effective_analyzer_output_url(&self) -> &str {
        self.analyzer_output_url
            .as_deref()
            .unwrap_or(DEFAULT_ANALYZER_OUTPUT_URL)
    }

    pub fn effective_hls_base_url(&self) -> &str {
        self.hls_base_url.as_deref().unwrap_or(DEFAULT_HLS_BASE_URL)
    }

    pub fn effective_rtsp_base_url(&self) -> &str {
        self.rtsp_base_url.as_deref().unwrap_or(DEFAULT_RTSP_BASE_URL)
    }

    pub fn effective_rtmp_base_url(&self) -> &str {
        self.rtmp_base_url.as_deref().unwrap_or(DEFAULT_RTMP_BASE_URL)
    }

    pub fn effective_license_python(&self) -> &str {
        self.license_python
            .as_deref()
            .unwrap_or(DEFAULT_LICENSE_PYTHON)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("License interpreter cannot be empty")]
    EmptyInterpreter,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let durations = [
        ("license_check_interval_secs", settings.license_check_interval_secs),
        ("stop_grace_secs", settings.stop_grace_secs),
        ("license_check_timeout_secs", settings.license_check_timeout_secs),
    ];
    if let Some((field, _)) = durations.iter().find(|(_, v)| *v == Some(0)) {
        return Err(SettingsError::ZeroDuration { field });
    }

    let urls = [
        ("analyzer_source_url", &settings.analyzer_source_url),
        ("analyzer_output_url", &settings.analyzer_output_url),
        ("hls_base_url", &settings.hls_base_url),
        ("rtsp_base_url", &settings.rtsp_base_url),
        ("rtmp_base_url", &settings.rtmp_base_url),
    ];
    for (field, value) in urls {
        if let Some(value) = value.as_ref().filter(|v| !is_host_url(v)) {
            return Err(SettingsError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }

    if settings
        .license_python
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyInterpreter);
    }

    Ok(())
}

/// An absolute URL naming a host.
fn is_host_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let settings = Settings::default();
        assert_eq!(settings.effective_license_check_interval(), Duration::from_secs(180));
        assert_eq!(settings.effective_restart_settle(), Duration::from_millis(1000));
        assert_eq!(settings.effective_stop_grace(), Duration::from_secs(5));
        assert_eq!(settings.license_check_timeout(), None);
        assert_eq!(settings.effective_analyzer_source_url(), DEFAULT_ANALYZER_SOURCE_URL);
        assert_eq!(settings.effective_license_python(), "python");
    }

    #[test]
    fn overrides_win() {
        let settings = Settings {
            restart_settle_ms: Some(50),
            license_check_timeout_secs: Some(30),
            hls_base_url: Some("http://10.0.0.2:8888".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.effective_restart_settle(), Duration::from_millis(50));
        assert_eq!(settings.license_check_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.effective_hls_base_url(), "http://10.0.0.2:8888");
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let settings = Settings {
            license_check_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::ZeroDuration {
                field: "license_check_interval_secs"
            })
        ));
    }

    #[test]
    fn validate_rejects_malformed_url() {
        let settings = Settings {
            rtsp_base_url: Some("localhost:8554".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn validate_requires_a_host() {
        for value in ["rtmp:///drone", "rtsp://", "http://exa mple.com", "drone"] {
            let settings = Settings {
                analyzer_source_url: Some(value.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(
                    validate_settings(&settings),
                    Err(SettingsError::InvalidUrl {
                        field: "analyzer_source_url",
                        ..
                    })
                ),
                "{value} should be rejected"
            );
        }

        let settings = Settings {
            analyzer_source_url: Some("rtmp://localhost:1935/drone".to_string()),
            hls_base_url: Some("http://[::1]:8888".to_string()),
            rtsp_base_url: Some("rtsp://10.0.0.2:8554".to_string()),
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn validate_accepts_defaults_and_zero_settle() {
        assert!(validate_settings(&Settings::default()).is_ok());
        let settings = Settings {
            restart_settle_ms: Some(0),
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn empty_json_is_default() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
