//! Data and resource root resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "NARADA_DATA_DIR";

/// Environment variable overriding the resource root.
pub const RESOURCE_DIR_ENV: &str = "NARADA_RESOURCE_DIR";

const APP_DIR_NAME: &str = "narada";

/// Get the root directory for persisted application state (presets, streams,
/// settings).
///
/// Resolution order:
/// 1. `NARADA_DATA_DIR` environment variable
/// 2. System local data directory joined with `narada`
///
/// The directory is created if it does not exist.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match non_empty_env(DATA_DIR_ENV) {
        Some(path) => PathBuf::from(path),
        None => dirs::data_local_dir()
            .ok_or(PathError::NoDataDir)?
            .join(APP_DIR_NAME),
    };
    ensure_dir(&root)?;
    Ok(root)
}

/// Get the root directory holding the bundled collaborators (relay binary,
/// analyzer scripts, license checker).
///
/// Resolution order:
/// 1. `NARADA_RESOURCE_DIR` environment variable
/// 2. Directory containing the running executable
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Some(path) = non_empty_env(RESOURCE_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    let exe = env::current_exe().map_err(|e| PathError::NoExecutableDir(e.to_string()))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| PathError::NoExecutableDir(exe.display().to_string()))
}

/// Create `path` (and parents) if missing.
pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::EmptyPath);
    }
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let base = env::temp_dir().join(format!("narada-paths-{}", std::process::id()));
        let nested = base.join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn ensure_dir_rejects_empty_path() {
        assert!(matches!(ensure_dir(Path::new("")), Err(PathError::EmptyPath)));
    }
}
