//! Application context wiring the supervisor, license reconciler, service
//! orchestrator and stores around one event bus.
//!
//! One `NaradaRuntime` owns all mutable supervision state; nothing here is
//! global, so independent instances can coexist (tests rely on this).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use narada_core::{
    AnalyzerEndpoints, LicenseState, ServiceKind, ServiceLayout, Settings, StatusEventBus,
    StoreError, StreamEndpoints,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::license::{CheckSchedule, CheckerCommand, LicenseCell, LicenseReconciler};
use crate::process::ChildProcessSupervisor;
use crate::services::{
    OrchestratorOptions, ServiceError, ServiceOrchestrator, ServiceSnapshot, StartOutcome,
};
use crate::store::{PresetStore, StreamStore};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Inputs for building a [`NaradaRuntime`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub data_root: PathBuf,
    pub layout: ServiceLayout,
    pub settings: Settings,
}

pub struct NaradaRuntime {
    bus: Arc<StatusEventBus>,
    supervisor: Arc<ChildProcessSupervisor>,
    reconciler: Arc<LicenseReconciler>,
    orchestrator: Arc<ServiceOrchestrator>,
    presets: PresetStore,
    streams: StreamStore,
    settings: Settings,
    data_root: PathBuf,
    cancel: CancellationToken,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl NaradaRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        let RuntimeConfig {
            data_root,
            layout,
            settings,
        } = config;

        let bus = Arc::new(StatusEventBus::new());
        let supervisor = Arc::new(ChildProcessSupervisor::new(
            bus.clone(),
            settings.effective_stop_grace(),
        ));
        let cell = Arc::new(LicenseCell::new());

        let checker = CheckerCommand {
            interpreter: PathBuf::from(settings.effective_license_python()),
            script: layout.license_script.clone(),
        };
        let reconciler = Arc::new(LicenseReconciler::new(
            Arc::clone(&supervisor),
            bus.clone(),
            Arc::clone(&cell),
            checker,
            settings.license_check_timeout(),
        ));

        let options = OrchestratorOptions {
            endpoints: AnalyzerEndpoints {
                source: settings.effective_analyzer_source_url().to_string(),
                stream_out: settings.effective_analyzer_output_url().to_string(),
            },
            settle: settings.effective_restart_settle(),
        };
        let orchestrator = Arc::new(ServiceOrchestrator::new(
            Arc::clone(&supervisor),
            cell,
            bus.clone(),
            layout,
            options,
        ));

        Self {
            presets: PresetStore::in_data_root(&data_root),
            streams: StreamStore::in_data_root(&data_root, settings.effective_hls_base_url()),
            bus,
            supervisor,
            reconciler,
            orchestrator,
            settings,
            data_root,
            cancel: CancellationToken::new(),
            background: Mutex::new(None),
        }
    }

    pub fn bus(&self) -> &Arc<StatusEventBus> {
        &self.bus
    }

    pub fn orchestrator(&self) -> &Arc<ServiceOrchestrator> {
        &self.orchestrator
    }

    pub fn reconciler(&self) -> &Arc<LicenseReconciler> {
        &self.reconciler
    }

    pub const fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub const fn streams(&self) -> &StreamStore {
        &self.streams
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn layout(&self) -> &ServiceLayout {
        self.orchestrator.layout()
    }

    /// Begin the startup sequence: a first license check shortly after this
    /// call, the relay once the license is valid, then periodic checks.
    /// Calling it again while running has no effect.
    pub fn start_background(&self) {
        let mut slot = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!("background tasks already running");
            return;
        }

        let reconciler = Arc::clone(&self.reconciler);
        let orchestrator = Arc::clone(&self.orchestrator);
        let schedule = CheckSchedule::from_settings(&self.settings);
        let cancel = self.cancel.child_token();
        info!(
            interval_secs = schedule.interval.as_secs(),
            "starting license schedule"
        );
        *slot = Some(tokio::spawn(async move {
            reconciler.run_periodic(&orchestrator, schedule, cancel).await;
        }));
    }

    /// Run one license check now, outside the schedule.
    pub async fn check_license(&self) -> LicenseState {
        self.reconciler.check_once().await
    }

    pub fn last_license_state(&self) -> LicenseState {
        self.reconciler.last_state()
    }

    pub fn get_status(&self, kind: ServiceKind) -> ServiceSnapshot {
        self.orchestrator.get_status(kind)
    }

    /// Start the analyzer with the config of preset `id` and remember the
    /// selection.
    pub fn start_analyzer_with_preset(&self, id: &str) -> Result<StartOutcome, RuntimeError> {
        let config = self.presets.resolve(id)?;
        self.presets.select(id)?;
        Ok(self
            .orchestrator
            .ensure_started(ServiceKind::Analyzer, Some(config))?)
    }

    /// Restart the analyzer with the config of preset `id` and remember the
    /// selection.
    pub async fn reconfigure_analyzer_with_preset(
        &self,
        id: &str,
    ) -> Result<StartOutcome, RuntimeError> {
        let config = self.presets.resolve(id)?;
        self.presets.select(id)?;
        Ok(self.orchestrator.reconfigure_analyzer(config).await?)
    }

    /// Playback URLs for a relay path name, from the configured base URLs.
    pub fn stream_endpoints(&self, name: &str) -> StreamEndpoints {
        StreamEndpoints::for_stream(
            name,
            self.settings.effective_hls_base_url(),
            self.settings.effective_rtsp_base_url(),
            self.settings.effective_rtmp_base_url(),
        )
    }

    /// Cancel scheduled checks and stop every supervised process.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "license schedule task failed");
            }
        }

        self.orchestrator.shutdown().await;
        self.supervisor.shutdown().await;
        info!("runtime shut down");
    }
}

impl std::fmt::Debug for NaradaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaradaRuntime")
            .field("data_root", &self.data_root)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
