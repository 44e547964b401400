//! Named analyzer presets.
//!
//! Built-in presets ship with the application and are never mutated. Custom
//! presets are created by the user and persisted in a [`PresetsDocument`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::analyzer::AnalyzerConfig;

/// Id of the preset selected when nothing else is.
pub const DEFAULT_PRESET_ID: &str = "standard";

/// Prefix of generated custom preset ids.
pub const CUSTOM_PRESET_PREFIX: &str = "custom-";

/// A named, reusable analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Unique id. Empty for a preset that has not been saved yet.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// True for built-in presets.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub settings: AnalyzerConfig,
    /// RFC 3339 creation time, set when a custom preset is first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Preset {
    /// A new, unsaved custom preset.
    pub fn custom(name: impl Into<String>, description: impl Into<String>, settings: AnalyzerConfig) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            locked: false,
            settings,
            created_at: None,
        }
    }
}

/// The persisted preset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetsDocument {
    #[serde(default = "default_preset_id")]
    pub last_used_preset: String,
    #[serde(default)]
    pub custom_presets: Vec<Preset>,
}

fn default_preset_id() -> String {
    DEFAULT_PRESET_ID.to_string()
}

impl Default for PresetsDocument {
    fn default() -> Self {
        Self {
            last_used_preset: default_preset_id(),
            custom_presets: Vec::new(),
        }
    }
}

/// Errors raised by preset operations.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Built-in presets cannot be overwritten or deleted.
    #[error("Preset '{0}' is built-in and cannot be modified")]
    BuiltinImmutable(String),

    /// No preset with this id exists.
    #[error("Preset not found: {0}")]
    NotFound(String),

    /// A preset needs a non-blank name.
    #[error("Preset name cannot be empty")]
    EmptyName,
}

/// Whether `id` names a built-in preset.
pub fn is_builtin_preset(id: &str) -> bool {
    builtin_presets().iter().any(|p| p.id == id)
}

/// Look up a built-in preset by id.
pub fn builtin_preset(id: &str) -> Option<Preset> {
    builtin_presets().into_iter().find(|p| p.id == id)
}

/// The presets shipped with the application.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        builtin(
            "standard",
            "Standard",
            "Fast detection for dense crowds",
            Tuning {
                mode: "standard",
                scale: 0.7,
                threshold: 0.39,
                track: false,
                multiscale: false,
                detect_interval: 2,
                max_drift: 20.0,
                ms_scales: "1.0",
            },
        ),
        builtin(
            "multiscale",
            "Multiscale",
            "Better for sparse/varied crowds",
            Tuning {
                mode: "multiscale",
                scale: 0.75,
                threshold: 0.30,
                track: false,
                multiscale: true,
                detect_interval: 2,
                max_drift: 20.0,
                ms_scales: "0.75,1.0,1.25",
            },
        ),
        builtin(
            "traffic",
            "Traffic",
            "Optimized for motorcycles/vehicles",
            Tuning {
                mode: "traffic",
                scale: 0.75,
                threshold: 0.28,
                track: true,
                multiscale: true,
                detect_interval: 10,
                max_drift: 25.0,
                ms_scales: "0.5,0.75,1.0,1.25",
            },
        ),
    ]
}

/// The fields that differ between built-in presets.
struct Tuning {
    mode: &'static str,
    scale: f64,
    threshold: f64,
    track: bool,
    multiscale: bool,
    detect_interval: u32,
    max_drift: f64,
    ms_scales: &'static str,
}

fn builtin(id: &str, name: &str, description: &str, tuning: Tuning) -> Preset {
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        locked: true,
        settings: AnalyzerConfig {
            mode: Some(tuning.mode.to_string()),
            scale: Some(tuning.scale),
            threshold: Some(tuning.threshold),
            fp16: Some(true),
            track: Some(tuning.track),
            multiscale: Some(tuning.multiscale),
            detect_interval: Some(tuning.detect_interval),
            max_drift: Some(tuning.max_drift),
            ms_scales: Some(tuning.ms_scales.to_string()),
            ms_threshold: Some(tuning.threshold),
            ms_nms_radius: Some(12),
            overlay_style: Some("boxes".to_string()),
            box_size: Some(14),
            box_thickness: Some(2),
            stream_fps: Some(24),
            stream_bitrate: Some("5000k".to_string()),
            stream_codec: Some("libx264".to_string()),
            stream_preset: Some("ultrafast".to_string()),
            queue_size: Some(5),
            gpu_id: Some("0".to_string()),
            ..AnalyzerConfig::default()
        },
        created_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_locked_and_unique() {
        let presets = builtin_presets();
        assert_eq!(presets.len(), 3);
        assert!(presets.iter().all(|p| p.locked));

        let mut ids: Vec<_> = presets.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn default_preset_is_builtin() {
        assert!(is_builtin_preset(DEFAULT_PRESET_ID));
        assert!(!is_builtin_preset("custom-1"));
    }

    #[test]
    fn multiscale_thresholds_follow_detection_threshold() {
        let traffic = builtin_preset("traffic").unwrap();
        assert_eq!(traffic.settings.ms_threshold, traffic.settings.threshold);
        assert_eq!(traffic.settings.track, Some(true));
    }

    #[test]
    fn document_defaults_when_fields_missing() {
        let doc: PresetsDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.last_used_preset, DEFAULT_PRESET_ID);
        assert!(doc.custom_presets.is_empty());
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let mut doc = PresetsDocument::default();
        doc.custom_presets.push(Preset::custom("Night", "", AnalyzerConfig::default()));
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"lastUsedPreset\":\"standard\""));
        assert!(json.contains("\"customPresets\""));
    }
}
