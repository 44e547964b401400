//! Domain types, status events and ports for the narada process supervisor.
//!
//! This crate holds everything that does not touch an OS process: the shapes
//! exchanged with collaborators and the UI, the event bus, and path/settings
//! resolution. Process handling lives in `narada-runtime`.

pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;

pub use domain::{
    AnalyzerConfig, AnalyzerEndpoints, CUSTOM_PRESET_PREFIX, DEFAULT_PRESET_ID, LicenseData,
    LicensePayload, LicenseState, LicenseVerdict, Preset, PresetError, PresetsDocument,
    ProcessKind, ServiceKind, StreamEndpoints, StreamEntry, StreamType, builtin_preset,
    builtin_presets, default_streams, is_builtin_preset,
};
pub use events::{EventTopic, Severity, StatusEvent, StatusEventBus, SubscriptionId};
pub use paths::{PathError, ServiceLayout, data_root, resource_root};
pub use ports::{LicenseGate, NoopEmitter, StaticLicenseGate, StatusEmitter, StoreError};
pub use settings::{Settings, SettingsError, validate_settings};
