//! Custom analyzer presets and the last-used selection.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use narada_core::paths::presets_path;
use narada_core::{
    AnalyzerConfig, CUSTOM_PRESET_PREFIX, DEFAULT_PRESET_ID, Preset, PresetError, PresetsDocument,
    StoreError, builtin_preset, builtin_presets, is_builtin_preset,
};
use tracing::info;

use super::document;

/// Presets document at a fixed path.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard location under `data_root`.
    pub fn in_data_root(data_root: &Path) -> Self {
        Self::new(presets_path(data_root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored document, or the default one if nothing is stored yet.
    pub fn load(&self) -> Result<PresetsDocument, StoreError> {
        Ok(document::read(&self.path)?.unwrap_or_default())
    }

    pub fn list_builtin(&self) -> Vec<Preset> {
        builtin_presets()
    }

    pub fn list_custom(&self) -> Result<Vec<Preset>, StoreError> {
        Ok(self.load()?.custom_presets)
    }

    /// Built-ins first, then customs in stored order.
    pub fn list_all(&self) -> Result<Vec<Preset>, StoreError> {
        let mut all = builtin_presets();
        all.extend(self.list_custom()?);
        Ok(all)
    }

    pub fn get(&self, id: &str) -> Result<Preset, StoreError> {
        if let Some(preset) = builtin_preset(id) {
            return Ok(preset);
        }
        self.load()?
            .custom_presets
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()).into())
    }

    /// The analyzer config stored under `id`.
    pub fn resolve(&self, id: &str) -> Result<AnalyzerConfig, StoreError> {
        Ok(self.get(id)?.settings)
    }

    /// Create or overwrite a custom preset and return it as stored.
    ///
    /// A preset whose id matches a stored custom preset replaces it in place.
    /// Any other id (including an empty one) creates a new entry with a fresh
    /// `custom-<millis>` id and a creation timestamp.
    pub fn save(&self, preset: Preset) -> Result<Preset, StoreError> {
        if is_builtin_preset(&preset.id) {
            return Err(PresetError::BuiltinImmutable(preset.id).into());
        }
        if preset.name.trim().is_empty() {
            return Err(PresetError::EmptyName.into());
        }

        let mut doc = self.load()?;
        let mut preset = Preset {
            locked: false,
            ..preset
        };

        if let Some(existing) = doc.custom_presets.iter_mut().find(|p| p.id == preset.id) {
            if preset.created_at.is_none() {
                preset.created_at.clone_from(&existing.created_at);
            }
            *existing = preset.clone();
            info!(id = %preset.id, name = %preset.name, "updated custom preset");
        } else {
            preset.id = fresh_id(&doc);
            preset.created_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
            doc.custom_presets.push(preset.clone());
            info!(id = %preset.id, name = %preset.name, "created custom preset");
        }

        document::write(&self.path, &doc)?;
        Ok(preset)
    }

    /// Delete a custom preset and return the selection afterwards.
    ///
    /// Deleting the selected preset moves the selection back to the default
    /// built-in.
    pub fn delete(&self, id: &str) -> Result<String, StoreError> {
        if is_builtin_preset(id) {
            return Err(PresetError::BuiltinImmutable(id.to_string()).into());
        }

        let mut doc = self.load()?;
        let before = doc.custom_presets.len();
        doc.custom_presets.retain(|p| p.id != id);
        if doc.custom_presets.len() == before {
            return Err(PresetError::NotFound(id.to_string()).into());
        }

        if doc.last_used_preset == id {
            doc.last_used_preset = DEFAULT_PRESET_ID.to_string();
        }
        document::write(&self.path, &doc)?;
        info!(id, selected = %doc.last_used_preset, "deleted custom preset");
        Ok(doc.last_used_preset)
    }

    pub fn last_used(&self) -> Result<String, StoreError> {
        let selected = self.load()?.last_used_preset;
        if selected.is_empty() {
            return Ok(DEFAULT_PRESET_ID.to_string());
        }
        Ok(selected)
    }

    /// Select `id`. It must name a built-in or stored custom preset.
    pub fn select(&self, id: &str) -> Result<(), StoreError> {
        let mut doc = self.load()?;
        if !is_builtin_preset(id) && !doc.custom_presets.iter().any(|p| p.id == id) {
            return Err(PresetError::NotFound(id.to_string()).into());
        }
        doc.last_used_preset = id.to_string();
        document::write(&self.path, &doc)
    }
}

/// `custom-<millis>`, bumped until it collides with nothing stored.
fn fresh_id(doc: &PresetsDocument) -> String {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let id = format!("{CUSTOM_PRESET_PREFIX}{stamp}");
        if !doc.custom_presets.iter().any(|p| p.id == id) {
            return id;
        }
        stamp += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PresetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::in_data_root(dir.path());
        (dir, store)
    }

    fn night() -> Preset {
        Preset::custom(
            "Night",
            "low light",
            AnalyzerConfig {
                threshold: Some(0.2),
                ..AnalyzerConfig::default()
            },
        )
    }

    #[test]
    fn empty_store_selects_default() {
        let (_dir, store) = store();
        assert_eq!(store.last_used().unwrap(), DEFAULT_PRESET_ID);
        assert!(store.list_custom().unwrap().is_empty());
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn save_without_id_assigns_fresh_ids() {
        let (_dir, store) = store();
        let a = store.save(night()).unwrap();
        let b = store.save(night()).unwrap();

        assert!(a.id.starts_with(CUSTOM_PRESET_PREFIX));
        assert_ne!(a.id, b.id);
        assert!(a.created_at.is_some());
        assert_eq!(store.list_custom().unwrap().len(), 2);
    }

    #[test]
    fn save_with_existing_id_overwrites_in_place() {
        let (_dir, store) = store();
        let first = store.save(night()).unwrap();
        let second = store.save(night()).unwrap();

        let mut edited = first.clone();
        edited.name = "Night v2".to_string();
        edited.created_at = None;
        store.save(edited).unwrap();

        let customs = store.list_custom().unwrap();
        assert_eq!(customs.len(), 2);
        assert_eq!(customs[0].id, first.id);
        assert_eq!(customs[0].name, "Night v2");
        assert_eq!(customs[0].created_at, first.created_at);
        assert_eq!(customs[1].id, second.id);
    }

    #[test]
    fn builtins_cannot_be_saved_over_or_deleted() {
        let (_dir, store) = store();
        let mut preset = night();
        preset.id = "traffic".to_string();

        assert!(matches!(
            store.save(preset),
            Err(StoreError::Preset(PresetError::BuiltinImmutable(_)))
        ));
        assert!(matches!(
            store.delete("standard"),
            Err(StoreError::Preset(PresetError::BuiltinImmutable(_)))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let (_dir, store) = store();
        let preset = Preset::custom("  ", "", AnalyzerConfig::default());
        assert!(matches!(
            store.save(preset),
            Err(StoreError::Preset(PresetError::EmptyName))
        ));
    }

    #[test]
    fn deleting_selected_preset_falls_back_to_default() {
        let (_dir, store) = store();
        let saved = store.save(night()).unwrap();
        store.select(&saved.id).unwrap();
        assert_eq!(store.last_used().unwrap(), saved.id);

        let selected = store.delete(&saved.id).unwrap();
        assert_eq!(selected, DEFAULT_PRESET_ID);
        assert_eq!(store.last_used().unwrap(), DEFAULT_PRESET_ID);
    }

    #[test]
    fn deleting_other_preset_keeps_selection() {
        let (_dir, store) = store();
        let keep = store.save(night()).unwrap();
        let drop = store.save(night()).unwrap();
        store.select(&keep.id).unwrap();

        assert_eq!(store.delete(&drop.id).unwrap(), keep.id);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.delete("custom-1"),
            Err(StoreError::Preset(PresetError::NotFound(_)))
        ));
        assert!(store.select("custom-1").is_err());
        assert!(store.resolve("custom-1").is_err());
    }

    #[test]
    fn resolve_returns_builtin_and_custom_settings() {
        let (_dir, store) = store();
        let saved = store.save(night()).unwrap();

        assert_eq!(store.resolve(&saved.id).unwrap().threshold, Some(0.2));
        assert_eq!(
            store.resolve("multiscale").unwrap().mode.as_deref(),
            Some("multiscale")
        );
    }
}
