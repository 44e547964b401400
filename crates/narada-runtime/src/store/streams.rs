//! Viewer stream configuration.

use std::path::{Path, PathBuf};

use narada_core::paths::streams_path;
use narada_core::{StoreError, StreamEntry, default_streams};
use tracing::info;

use super::document;

/// Ordered stream list persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct StreamStore {
    path: PathBuf,
    hls_base: String,
}

impl StreamStore {
    /// `hls_base` is used to build the URL of the seeded default stream.
    pub fn new(path: impl Into<PathBuf>, hls_base: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hls_base: hls_base.into(),
        }
    }

    pub fn in_data_root(data_root: &Path, hls_base: impl Into<String>) -> Self {
        Self::new(streams_path(data_root), hls_base)
    }

    /// All streams sorted by position. A missing or empty list is seeded
    /// with the default stream and written back.
    pub fn load(&self) -> Result<Vec<StreamEntry>, StoreError> {
        let mut streams: Vec<StreamEntry> = document::read(&self.path)?.unwrap_or_default();
        if streams.is_empty() {
            streams = default_streams(&self.hls_base);
            document::write(&self.path, &streams)?;
            info!(path = %self.path.display(), "seeded default streams");
        }
        streams.sort_by_key(|s| s.position);
        Ok(streams)
    }

    /// Replace the whole list.
    pub fn save(&self, streams: &[StreamEntry]) -> Result<(), StoreError> {
        document::write(&self.path, &streams)
    }

    pub fn enabled(&self) -> Result<Vec<StreamEntry>, StoreError> {
        Ok(self.load()?.into_iter().filter(|s| s.enabled).collect())
    }

    pub fn get(&self, id: &str) -> Result<StreamEntry, StoreError> {
        self.load()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("stream {id}")))
    }

    /// Append `entry`; its position is placed after the current last one.
    pub fn add(&self, mut entry: StreamEntry) -> Result<StreamEntry, StoreError> {
        let mut streams = self.load()?;
        if streams.iter().any(|s| s.id == entry.id) {
            return Err(StoreError::AlreadyExists(format!("stream {}", entry.id)));
        }
        entry.position = streams.iter().map(|s| s.position + 1).max().unwrap_or(0);
        streams.push(entry.clone());
        self.save(&streams)?;
        info!(id = %entry.id, name = %entry.name, "added stream");
        Ok(entry)
    }

    pub fn update(&self, entry: StreamEntry) -> Result<(), StoreError> {
        let mut streams = self.load()?;
        let slot = streams
            .iter_mut()
            .find(|s| s.id == entry.id)
            .ok_or_else(|| StoreError::NotFound(format!("stream {}", entry.id)))?;
        *slot = entry;
        self.save(&streams)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut streams = self.load()?;
        let before = streams.len();
        streams.retain(|s| s.id != id);
        if streams.len() == before {
            return Err(StoreError::NotFound(format!("stream {id}")));
        }
        self.save(&streams)?;
        info!(id, "deleted stream");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use narada_core::StreamType;

    use super::*;

    fn entry(id: &str) -> StreamEntry {
        StreamEntry {
            id: id.to_string(),
            name: format!("cam{id}"),
            display_name: format!("Camera {id}"),
            stream_type: StreamType::Rtsp,
            url: format!("rtsp://localhost:8554/cam{id}"),
            enabled: true,
            position: 0,
        }
    }

    #[test]
    fn missing_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamStore::in_data_root(dir.path(), "http://localhost:8888");

        let streams = store.load().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "drone");
        assert!(store.path.exists());
    }

    #[test]
    fn add_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamStore::in_data_root(dir.path(), "http://localhost:8888");

        let added = store.add(entry("2")).unwrap();
        assert_eq!(added.position, 1);
        assert!(matches!(store.add(entry("2")), Err(StoreError::AlreadyExists(_))));

        let mut disabled = added;
        disabled.enabled = false;
        store.update(disabled).unwrap();
        let enabled: Vec<_> = store.enabled().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(enabled, vec!["1".to_string()]);

        store.delete("2").unwrap();
        assert!(matches!(store.delete("2"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.get("2"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn load_orders_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamStore::in_data_root(dir.path(), "http://localhost:8888");
        let mut late = entry("a");
        late.position = 5;
        let mut early = entry("b");
        early.position = 1;
        store.save(&[late, early]).unwrap();

        let ids: Vec<_> = store.load().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }
}
