//! CLI bootstrap - the composition root.
//!
//! Resolves the data and resource roots, loads persisted settings and builds
//! the [`NaradaRuntime`] every handler works against.

use std::path::PathBuf;

use narada_core::paths::ensure_dir;
use narada_core::{ServiceLayout, data_root, resource_root};
use narada_runtime::{NaradaRuntime, RuntimeConfig, SettingsStore};
use tracing::debug;

use crate::error::CliError;

/// Root overrides from the command line. `None` falls back to the
/// environment, then the platform defaults.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub resource_dir: Option<PathBuf>,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    runtime: NaradaRuntime,
    settings_store: SettingsStore,
}

impl CliContext {
    pub const fn runtime(&self) -> &NaradaRuntime {
        &self.runtime
    }

    pub const fn settings_store(&self) -> &SettingsStore {
        &self.settings_store
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let data_root = match config.data_dir {
        Some(dir) => {
            ensure_dir(&dir)?;
            dir
        }
        None => data_root()?,
    };
    let resource_root = match config.resource_dir {
        Some(dir) => dir,
        None => resource_root()?,
    };

    let settings_store = SettingsStore::in_data_root(&data_root);
    let settings = settings_store.load()?;
    debug!(
        data_root = %data_root.display(),
        resource_root = %resource_root.display(),
        "bootstrapping runtime"
    );

    let runtime = NaradaRuntime::new(RuntimeConfig {
        data_root,
        layout: ServiceLayout::under(resource_root),
        settings,
    });

    Ok(CliContext {
        runtime,
        settings_store,
    })
}
