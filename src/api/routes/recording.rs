//! Remote Control Routes
//!
//! - POST <base>/microscope-api/toggle-recording - Flip the recording flag

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RecordingResponse;
use crate::api::state::AppState;

/// POST <base>/microscope-api/toggle-recording
///
/// Flip the server-side recording flag. Callers do not wait for this.
pub async fn toggle_recording(State(state): State<Arc<AppState>>) -> Json<RecordingResponse> {
    let recording = state.toggle_recording();
    tracing::info!(recording, "Recording toggled");
    Json(RecordingResponse { recording })
}
