//! Dashboard Client
//!
//! The single-page dashboard's client side, without rendering:
//!
//! - **bootstrap**: startup configuration injected by the server
//! - **routes**: the static route table
//! - **router**: hash-fragment resolution and navigation
//! - **screen**: statically typed views the routes produce
//! - **shell**: root state owner (alerts, auto-load preference, recording)
//! - **storage**: durable client-side key/value slot
//! - **remote**: fire-and-forget backend notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use microscope::dashboard::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bootstrap = BootstrapConfig::new("UTC", "microscope", false);
//!     let remote = HttpRemoteControl::new("http://localhost:8888", &bootstrap, Duration::from_secs(5))?;
//!     let mut shell = ApplicationShell::mount(bootstrap, MemoryStorage::new(), remote)?;
//!
//!     shell.visit("/microscope/#/processes/42")?;
//!     shell.toggle_recording().detach();
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod remote;
pub mod router;
pub mod routes;
pub mod screen;
pub mod shell;
pub mod storage;

pub use bootstrap::{base_path, normalize_mount_path, router_base_path, BootstrapConfig};
pub use remote::{Dispatch, HttpRemoteControl, RemoteAction, RemoteControl, RemoteError};
pub use router::{ActiveView, RouteParams, Router, RouterError};
pub use routes::{route_table, RouteEntry, RouteTarget};
pub use screen::{Screen, ViewFactory};
pub use shell::{Alert, AlertCallback, AlertKind, ApplicationShell, ShellState, AUTO_LOAD_KEY};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, StorageError};
