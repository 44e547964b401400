//! Domain types shared by the runtime and its adapters.

pub mod analyzer;
pub mod license;
pub mod preset;
pub mod process;
pub mod stream;

pub use analyzer::{AnalyzerConfig, AnalyzerEndpoints};
pub use license::{LicenseData, LicensePayload, LicenseState, LicenseVerdict};
pub use preset::{
    CUSTOM_PRESET_PREFIX, DEFAULT_PRESET_ID, Preset, PresetError, PresetsDocument,
    builtin_preset, builtin_presets, is_builtin_preset,
};
pub use process::{ProcessKind, ServiceKind};
pub use stream::{StreamEndpoints, StreamEntry, StreamType, default_streams};
