//! Index Routes
//!
//! Serves the page that mounts the dashboard shell.
//!
//! - GET <base> - Index page
//! - GET <base>/ - Index page

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::assets::render_index;
use crate::api::state::AppState;

/// GET <base>
///
/// Render the shell with the current startup configuration.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let bootstrap = state.bootstrap();
    Html(render_index(&state.config.app_name, &state.assets, &bootstrap))
}
