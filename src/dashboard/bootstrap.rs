//! Startup Configuration
//!
//! The settings object the server injects into the index page before the
//! shell mounts. It is constructed once and handed to the router and the
//! application shell by reference.

use serde::{Deserialize, Serialize};

/// Settings injected into the page as `window.Microscope`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BootstrapFields")]
pub struct BootstrapConfig {
    /// IANA zone name used for display formatting
    pub timezone: String,
    /// Deployment mount path (may be empty)
    pub path: String,
    /// Initial server-side recording state
    pub recording: bool,
    /// Prefix of the JSON job API
    pub api_path: String,
}

/// Wire form; a missing `apiPath` is derived from the mount path.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapFields {
    timezone: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    recording: bool,
    #[serde(default)]
    api_path: String,
}

impl From<BootstrapFields> for BootstrapConfig {
    fn from(fields: BootstrapFields) -> Self {
        let mut config = Self::new(fields.timezone, fields.path, fields.recording);
        if !fields.api_path.trim().is_empty() {
            config.api_path = fields.api_path;
        }
        config
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::new("UTC", "", false)
    }
}

impl BootstrapConfig {
    pub fn new(timezone: impl Into<String>, path: impl Into<String>, recording: bool) -> Self {
        let path = normalize_mount_path(&path.into());
        let api_path = format!("{}/api/", base_path(&path));
        Self {
            timezone: timezone.into(),
            path,
            recording,
            api_path,
        }
    }

    /// Prefix for server URLs: `""` at the root, `/<mount>` otherwise.
    pub fn base_path(&self) -> String {
        base_path(&self.path)
    }

    /// Base the hash router is mounted under.
    pub fn router_base(&self) -> String {
        router_base_path(&self.path)
    }

    /// Endpoint the shell notifies when recording is toggled.
    pub fn toggle_recording_path(&self) -> String {
        format!("{}/microscope-api/toggle-recording", self.base_path())
    }
}

/// Strip surrounding slashes so `/dashboard/`, `dashboard` and `/dashboard`
/// all name the same mount.
pub fn normalize_mount_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

/// Server prefix for a mount path. Empty or `/` collapses to nothing.
pub fn base_path(mount_path: &str) -> String {
    let mount = normalize_mount_path(mount_path);
    if mount.is_empty() {
        String::new()
    } else {
        format!("/{}", mount)
    }
}

/// Router base for a mount path: `/` at the root, `/<mount>/` otherwise.
pub fn router_base_path(mount_path: &str) -> String {
    format!("{}/", base_path(mount_path))
}
