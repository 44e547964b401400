//! Path resolution for the data directory and the bundled collaborators.
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No terminal I/O; adapters report errors themselves
//! - Environment overrides are read here and nowhere else

mod error;
mod platform;
mod services;

pub use error::PathError;
pub use platform::{DATA_DIR_ENV, RESOURCE_DIR_ENV, data_root, ensure_dir, resource_root};
pub use services::ServiceLayout;

use std::path::{Path, PathBuf};

/// Custom presets document.
pub fn presets_path(data_root: &Path) -> PathBuf {
    data_root.join("crowd-counter-presets.json")
}

/// Stream configuration document.
pub fn streams_path(data_root: &Path) -> PathBuf {
    data_root.join("streams.json")
}

/// Persisted settings.
pub fn settings_path(data_root: &Path) -> PathBuf {
    data_root.join("settings.json")
}
