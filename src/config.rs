//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig as RuntimeApiConfig;
use crate::dashboard::{normalize_mount_path, BootstrapConfig};

/// Top-level paths the server claims for itself, outside the mount
pub const RESERVED_MOUNT_PATHS: [&str; 2] = ["static", "health"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional JSON file the job store is seeded from
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed_file: None,
        }
    }
}

/// What the served dashboard looks like
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Mount path, empty to serve from the root
    #[serde(default = "default_mount_path")]
    pub path: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Resolve assets through mix-manifest.json
    #[serde(default)]
    pub production: bool,

    /// Recording state at startup
    #[serde(default)]
    pub recording: bool,
}

fn default_mount_path() -> String {
    "microscope".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_app_name() -> String {
    "Microscope".to_string()
}

fn default_assets_dir() -> PathBuf {
    crate::api::assets::default_assets_dir()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            path: default_mount_path(),
            timezone: default_timezone(),
            app_name: default_app_name(),
            assets_dir: default_assets_dir(),
            production: false,
            recording: false,
        }
    }
}

/// Settings for the command-line shell
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin of the dashboard server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Client storage file (defaults to the data directory)
    #[serde(default)]
    pub storage_file: Option<PathBuf>,
}

fn default_server_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_secs: default_request_timeout(),
            storage_file: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.dashboard.path = normalize_mount_path(&config.dashboard.path);
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let first_segment = self.dashboard.path.split('/').next().unwrap_or_default();
        if RESERVED_MOUNT_PATHS.contains(&first_segment) {
            return Err(ConfigError::ReservedMountPath(self.dashboard.path.clone()));
        }
        Ok(())
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("microscope").join("config.toml")),
            Some(PathBuf::from("/etc/microscope/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = var("MICROSCOPE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("MICROSCOPE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Some(seed) = var("MICROSCOPE_SEED_FILE") {
            self.server.seed_file = Some(PathBuf::from(seed));
        }

        // Dashboard overrides
        if let Some(path) = var("MICROSCOPE_PATH") {
            self.dashboard.path = normalize_mount_path(&path);
        }
        if let Some(timezone) = var("MICROSCOPE_TIMEZONE") {
            self.dashboard.timezone = timezone;
        }
        if let Some(dir) = var("MICROSCOPE_ASSETS_DIR") {
            self.dashboard.assets_dir = PathBuf::from(dir);
        }
        if let Some(production) = var("MICROSCOPE_PRODUCTION") {
            self.dashboard.production = production.to_lowercase() != "false" && production != "0";
        }

        // Client overrides
        if let Some(url) = var("MICROSCOPE_SERVER_URL") {
            self.client.server_url = url;
        }

        // Logging overrides
        if let Some(level) = var("MICROSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("MICROSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Runtime settings for the HTTP server
    pub fn api_config(&self) -> RuntimeApiConfig {
        RuntimeApiConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            mount_path: self.dashboard.path.clone(),
            timezone: self.dashboard.timezone.clone(),
            app_name: self.dashboard.app_name.clone(),
            assets_dir: self.dashboard.assets_dir.clone(),
            production: self.dashboard.production,
            recording: self.dashboard.recording,
        }
    }

    /// Startup configuration for a shell talking to this deployment
    pub fn bootstrap(&self) -> BootstrapConfig {
        BootstrapConfig::new(
            self.dashboard.timezone.clone(),
            self.dashboard.path.clone(),
            self.dashboard.recording,
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Mount path '{0}' collides with a built-in route (static, health)")]
    ReservedMountPath(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Microscope Configuration
#
# Environment variables override these settings:
# - MICROSCOPE_HOST
# - MICROSCOPE_PORT
# - MICROSCOPE_SEED_FILE
# - MICROSCOPE_PATH
# - MICROSCOPE_TIMEZONE
# - MICROSCOPE_ASSETS_DIR
# - MICROSCOPE_PRODUCTION
# - MICROSCOPE_SERVER_URL
# - MICROSCOPE_LOG_LEVEL
# - MICROSCOPE_LOG_FORMAT

[server]
# Server host
host = "0.0.0.0"

# Server port
port = 8888

# JSON file to seed the job store from
# seed_file = "./jobs.json"

[dashboard]
# Mount path; leave empty to serve the dashboard from "/"
path = "microscope"

# Time zone used to display timestamps
timezone = "UTC"

# Page title
app_name = "Microscope"

# Directory with the compiled app.js / app.css
assets_dir = "assets/dist"

# Resolve versioned asset names through mix-manifest.json
production = false

# Recording state at startup
recording = false

[client]
# Dashboard server the CLI talks to
server_url = "http://localhost:8888"

# Request timeout in seconds
request_timeout_secs = 10

# Where the CLI keeps its preferences
# storage_file = "~/.local/share/microscope/client-storage.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.dashboard.path, "microscope");
        assert_eq!(config.client.request_timeout_secs, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[dashboard]\npath = \"/ops/\"\n").unwrap();
        assert_eq!(config.dashboard.path, "ops");
        assert_eq!(config.dashboard.timezone, "UTC");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.api_config().base_path(), "/ops");
        assert_eq!(config.bootstrap().router_base(), "/ops/");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MICROSCOPE_PORT", "9000"),
            ("MICROSCOPE_PATH", ""),
            ("MICROSCOPE_PRODUCTION", "1"),
            ("MICROSCOPE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dashboard.path, "");
        assert!(config.dashboard.production);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.bootstrap().router_base(), "/");
    }

    #[test]
    fn test_reserved_mount_paths_rejected() {
        for path in ["static", "/health/", "static/app"] {
            let config = Config::parse(&format!("[dashboard]\npath = \"{}\"\n", path)).unwrap();
            assert!(matches!(config.validate(), Err(ConfigError::ReservedMountPath(_))));
        }

        let config = Config::parse("[dashboard]\npath = \"statistics\"\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reserved_mount_path_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dashboard]\npath = \"health\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ReservedMountPath(_))));
    }

    #[test]
    fn test_reserved_mount_path_from_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "MICROSCOPE_PATH").then(|| "/static".to_string()));
        assert_eq!(config.dashboard.path, "static");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/microscope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
