//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::assets::{default_assets_dir, AssetManifest};
use crate::dashboard::{base_path, normalize_mount_path, BootstrapConfig};
use crate::jobs::{JobBackend, MemoryJobStore};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Job backend the monitoring API reads
    pub jobs: Arc<dyn JobBackend>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Versioned asset names for the index page
    pub assets: Arc<AssetManifest>,
    /// Server-side recording flag
    pub recording: Arc<AtomicBool>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state over a job backend, loading the asset manifest
    pub fn new(jobs: Arc<dyn JobBackend>, config: ApiConfig) -> Self {
        let assets = AssetManifest::load(&config.assets_dir, config.production);
        Self::with_assets(jobs, config, assets)
    }

    /// Create state with an explicit asset manifest
    pub fn with_assets(jobs: Arc<dyn JobBackend>, config: ApiConfig, assets: AssetManifest) -> Self {
        Self {
            jobs,
            recording: Arc::new(AtomicBool::new(config.recording)),
            config: Arc::new(config),
            assets: Arc::new(assets),
            start_time: Instant::now(),
        }
    }

    /// State over an empty in-memory store
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(Arc::new(MemoryJobStore::new()), config)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Flip the recording flag, returning the new value
    pub fn toggle_recording(&self) -> bool {
        !self.recording.fetch_xor(true, Ordering::SeqCst)
    }

    /// Startup configuration for the page served now
    pub fn bootstrap(&self) -> BootstrapConfig {
        BootstrapConfig::new(
            self.config.timezone.clone(),
            self.config.mount_path.clone(),
            self.is_recording(),
        )
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Mount path of the dashboard (empty for the root)
    pub mount_path: String,
    /// Display time zone handed to the shell
    pub timezone: String,
    /// Title of the index page
    pub app_name: String,
    /// Directory of compiled assets
    pub assets_dir: PathBuf,
    /// Resolve assets through the manifest
    pub production: bool,
    /// Initial recording state
    pub recording: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            mount_path: "microscope".to_string(),
            timezone: "UTC".to_string(),
            app_name: "Microscope".to_string(),
            assets_dir: default_assets_dir(),
            production: false,
            recording: false,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Same config mounted elsewhere
    pub fn mounted_at(mut self, mount_path: impl Into<String>) -> Self {
        self.mount_path = normalize_mount_path(&mount_path.into());
        self
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL prefix of the dashboard: `""` or `/<mount>`
    pub fn base_path(&self) -> String {
        base_path(&self.mount_path)
    }
}
