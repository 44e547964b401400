//! Whole-document JSON persistence shared by the stores.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use narada_core::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Read and decode `path`. `Ok(None)` when the file does not exist.
pub(super) fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    debug!(path = %path.display(), bytes = text.len(), "read document");

    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
}

/// Encode `value` as pretty JSON and replace `path` with it.
pub(super) fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StoreError::Storage(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    fs::write(path, json)
        .map_err(|e| StoreError::Storage(format!("failed to write {}: {e}", path.display())))?;
    debug!(path = %path.display(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_blank_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        assert!(read::<Vec<u32>>(&path).unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(read::<Vec<u32>>(&path).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            read::<Vec<u32>>(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write(&path, &vec![1, 2, 3]).unwrap();
        assert_eq!(read::<Vec<u32>>(&path).unwrap(), Some(vec![1, 2, 3]));
    }
}
