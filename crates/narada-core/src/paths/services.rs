//! Locations of the bundled collaborator programs.

use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::resource_root;

#[cfg(target_os = "windows")]
const RELAY_BINARY: &str = "mediamtx.exe";
#[cfg(not(target_os = "windows"))]
const RELAY_BINARY: &str = "mediamtx";

/// Every path the orchestrator and license checker need, derived from one
/// resource root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLayout {
    pub resource_root: PathBuf,
    pub relay_dir: PathBuf,
    pub relay_exe: PathBuf,
    pub relay_config: PathBuf,
    /// Bundled interpreter used to run the analyzer.
    pub analyzer_python: PathBuf,
    pub analyzer_script: PathBuf,
    pub analyzer_model: PathBuf,
    pub analyzer_cwd: PathBuf,
    pub license_script: PathBuf,
}

impl ServiceLayout {
    /// Lay out collaborator paths under `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let relay_dir = root.join("mediamtx");
        let analyzer_cwd = root.join("crowd_counter");

        Self {
            resource_root: root.to_path_buf(),
            relay_exe: relay_dir.join(RELAY_BINARY),
            relay_config: relay_dir.join("mediamtx.yml"),
            relay_dir,
            analyzer_python: bundled_python(root),
            analyzer_script: analyzer_cwd.join("live_feed_stream.py"),
            analyzer_model: analyzer_cwd.join("models").join("model.pth"),
            analyzer_cwd,
            license_script: root.join("license-checker.py"),
        }
    }

    /// Lay out collaborator paths under the resolved resource root.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::under(resource_root()?))
    }
}

#[cfg(target_os = "windows")]
fn bundled_python(root: &Path) -> PathBuf {
    root.join("python").join("python.exe")
}

#[cfg(not(target_os = "windows"))]
fn bundled_python(root: &Path) -> PathBuf {
    root.join("python").join("bin").join("python3")
}

impl std::fmt::Display for ServiceLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Resource root:   {}", self.resource_root.display())?;
        writeln!(f, "Relay binary:    {}", self.relay_exe.display())?;
        writeln!(f, "Relay config:    {}", self.relay_config.display())?;
        writeln!(f, "Python:          {}", self.analyzer_python.display())?;
        writeln!(f, "Analyzer script: {}", self.analyzer_script.display())?;
        writeln!(f, "Analyzer model:  {}", self.analyzer_model.display())?;
        write!(f, "License checker: {}", self.license_script.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted() {
        let layout = ServiceLayout::under("/opt/narada");
        assert!(layout.relay_exe.starts_with("/opt/narada/mediamtx"));
        assert_eq!(layout.relay_config, PathBuf::from("/opt/narada/mediamtx/mediamtx.yml"));
        assert_eq!(
            layout.analyzer_model,
            PathBuf::from("/opt/narada/crowd_counter/models/model.pth")
        );
        assert_eq!(layout.analyzer_script.parent(), Some(layout.analyzer_cwd.as_path()));
        assert_eq!(layout.license_script, PathBuf::from("/opt/narada/license-checker.py"));
    }
}
