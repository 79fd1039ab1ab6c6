//! Dashboard Assets
//!
//! Resolves compiled CSS/JS names through the build's `mix-manifest.json`
//! and renders the index page that mounts the shell.
//!
//! In production the manifest maps `/app.js` to a versioned name such as
//! `/app.js?id=3f2a`. Outside production, or when the manifest or the key is
//! missing, the name is used unchanged. The leading slash is always dropped
//! so the result can be appended to the static prefix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dashboard::BootstrapConfig;

/// File the asset build writes next to its output
pub const MANIFEST_FILE: &str = "mix-manifest.json";

/// URL prefix static files are served under
pub const STATIC_PREFIX: &str = "/static/";

/// Versioned asset lookup, read once at startup
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    production: bool,
    entries: HashMap<String, String>,
}

impl AssetManifest {
    /// Read the manifest from `dir` when running in production.
    pub fn load(dir: &Path, production: bool) -> Self {
        if !production {
            return Self::default();
        }

        let path = dir.join(MANIFEST_FILE);
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Malformed asset manifest, using plain names");
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Asset manifest unavailable, using plain names");
                HashMap::new()
            }
        };

        tracing::debug!(entries = entries.len(), "Loaded asset manifest");
        Self {
            production,
            entries,
        }
    }

    /// Manifest with fixed entries
    pub fn from_entries(production: bool, entries: HashMap<String, String>) -> Self {
        Self {
            production,
            entries,
        }
    }

    /// Resolve `/app.css` to the name to request under [`STATIC_PREFIX`].
    pub fn resolve(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }

        let resolved = if self.production {
            self.entries.get(path).map(String::as_str).unwrap_or(path)
        } else {
            path
        };
        resolved.strip_prefix('/').unwrap_or(resolved).to_string()
    }

    /// Full static URL of an asset
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", STATIC_PREFIX, self.resolve(path))
    }
}

/// Where the dashboard's compiled files live
pub fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets/dist")
}

/// Render the page that boots the shell with `bootstrap` as `window.Microscope`.
pub fn render_index(app_name: &str, manifest: &AssetManifest, bootstrap: &BootstrapConfig) -> String {
    let settings = serde_json::to_string(bootstrap)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");
    let title = escape_html(app_name);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="{css}">
</head>
<body>
<div id="microscope" v-cloak>
    <router-view></router-view>
</div>
<script>
    window.Microscope = {settings};
</script>
<script src="{js}"></script>
</body>
</html>
"#,
        title = title,
        css = escape_html(&manifest.url("/app.css")),
        js = escape_html(&manifest.url("/app.js")),
        settings = settings,
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
