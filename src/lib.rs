//! # Microscope
//!
//! Monitoring dashboard for a background job system: worker pools, queues,
//! and the scheduled, retry and dead job sets.
//!
//! ## Modules
//!
//! - [`dashboard`]: client-side shell, route table and hash router
//! - [`jobs`]: job backend trait and in-memory store
//! - [`api`]: HTTP server with Axum (index page, job API, remote control)
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use microscope::dashboard::{ApplicationShell, BootstrapConfig, HttpRemoteControl, MemoryStorage};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bootstrap = BootstrapConfig::new("UTC", "microscope", false);
//!     let remote = HttpRemoteControl::new("http://localhost:8888", &bootstrap, Duration::from_secs(5))?;
//!     let mut shell = ApplicationShell::mount(bootstrap, MemoryStorage::new(), remote)?;
//!
//!     let view = shell.visit("/microscope/#/")?;
//!     println!("Showing {}", view.screen);
//!
//!     shell.toggle_recording().wait().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod jobs;
pub mod logging;

// Re-export top-level types for convenience
pub use dashboard::{
    ActiveView, ApplicationShell, BootstrapConfig, ClientStorage, Dispatch, FileStorage,
    HttpRemoteControl, MemoryStorage, RemoteAction, RemoteControl, RemoteError, RouteParams,
    Router, RouterError, Screen,
};

pub use jobs::{JobBackend, JobError, JobResult, MemoryJobStore, StoreSnapshot};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
