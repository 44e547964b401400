//! Persisted settings.

use std::path::{Path, PathBuf};

use narada_core::paths::settings_path;
use narada_core::{Settings, StoreError, validate_settings};
use tracing::warn;

use super::document;

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_data_root(data_root: &Path) -> Self {
        Self::new(settings_path(data_root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or defaults when no file exists. A stored document
    /// that fails validation is rejected rather than partially applied.
    pub fn load(&self) -> Result<Settings, StoreError> {
        let settings: Settings = document::read(&self.path)?.unwrap_or_default();
        validate_settings(&settings).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "invalid settings file");
            StoreError::Invalid(e.to_string())
        })?;
        Ok(settings)
    }

    /// Validate and persist.
    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        validate_settings(settings).map_err(|e| StoreError::Invalid(e.to_string()))?;
        document::write(&self.path, settings)
    }
}
