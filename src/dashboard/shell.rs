//! Application Shell
//!
//! Root state owner of the dashboard. Holds the alert slot, the auto-load
//! preference and the recording flag, and hosts the router's active view.
//! All mutation goes through `&mut self`, so there is a single writer.

use serde::Serialize;
use std::time::{Duration, Instant};

use super::bootstrap::BootstrapConfig;
use super::remote::{Dispatch, RemoteAction, RemoteControl};
use super::router::{ActiveView, RouteParams, Router, RouterError};
use super::storage::ClientStorage;

/// Storage key of the auto-load preference
pub const AUTO_LOAD_KEY: &str = "autoLoadsNewEntries";

/// Milliseconds before a success alert closes itself
pub const SUCCESS_AUTO_CLOSE_MS: u64 = 5000;

/// Alert flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Error,
    Confirmation,
}

/// Callback attached to a confirmation alert
pub type AlertCallback = Box<dyn FnOnce() + Send>;

/// The single alert/confirmation slot. `kind == None` means no alert.
#[derive(Default)]
pub struct Alert {
    pub kind: Option<AlertKind>,
    /// Auto-close delay in milliseconds, 0 to stay open
    pub auto_close: u64,
    pub message: String,
    opened_at: Option<Instant>,
    confirmation_proceed: Option<AlertCallback>,
    confirmation_cancel: Option<AlertCallback>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    /// When an auto-closing alert is due to close
    pub fn closes_at(&self) -> Option<Instant> {
        match (self.auto_close, self.opened_at) {
            (0, _) | (_, None) => None,
            (ms, Some(opened)) => Some(opened + Duration::from_millis(ms)),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.closes_at().is_some_and(|at| now >= at)
    }
}

impl std::fmt::Debug for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alert")
            .field("kind", &self.kind)
            .field("auto_close", &self.auto_close)
            .field("message", &self.message)
            .field("has_proceed", &self.confirmation_proceed.is_some())
            .field("has_cancel", &self.confirmation_cancel.is_some())
            .finish()
    }
}

/// State owned by the shell for the page's lifetime
#[derive(Debug, Default)]
pub struct ShellState {
    pub alert: Alert,
    pub auto_loads_new_entries: bool,
    pub recording: bool,
}

/// The dashboard's root container
pub struct ApplicationShell<S, R> {
    bootstrap: BootstrapConfig,
    router: Router,
    state: ShellState,
    storage: S,
    remote: R,
}

impl<S, R> ApplicationShell<S, R>
where
    S: ClientStorage,
    R: RemoteControl,
{
    /// Build the shell from the startup configuration.
    ///
    /// The auto-load preference is read from storage once, here.
    pub fn mount(bootstrap: BootstrapConfig, storage: S, remote: R) -> Result<Self, RouterError> {
        let router = Router::new(&bootstrap)?;
        let state = ShellState {
            alert: Alert::default(),
            auto_loads_new_entries: storage.get(AUTO_LOAD_KEY).as_deref() == Some("1"),
            recording: bootstrap.recording,
        };

        tracing::debug!(
            base = %router.base(),
            recording = state.recording,
            auto_load = state.auto_loads_new_entries,
            "Shell mounted"
        );

        Ok(Self {
            bootstrap,
            router,
            state,
            storage,
            remote,
        })
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn bootstrap(&self) -> &BootstrapConfig {
        &self.bootstrap
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// View in the shell's view slot
    pub fn active_view(&self) -> Option<&ActiveView> {
        self.router.current()
    }

    /// Load a location (full URL path or fragment) into the view slot.
    pub fn visit(&mut self, location: &str) -> Result<&ActiveView, RouterError> {
        self.router.sync(location)
    }

    pub fn navigate(&mut self, name: &str, params: &RouteParams) -> Result<&ActiveView, RouterError> {
        self.router.navigate(name, params)
    }

    /// Flip the auto-load preference and persist it as `"1"`/`"0"`.
    pub fn toggle_auto_load_new_entries(&mut self) -> bool {
        let enabled = !self.state.auto_loads_new_entries;
        self.state.auto_loads_new_entries = enabled;

        let value = if enabled { "1" } else { "0" };
        if let Err(e) = self.storage.set(AUTO_LOAD_KEY, value) {
            tracing::warn!(error = %e, "Failed to persist auto-load preference");
        }
        enabled
    }

    /// Ask the backend to toggle recording and flip the local flag.
    ///
    /// The flag flips before this returns, whatever happens to the request,
    /// and the startup configuration is kept in step with it.
    /// The returned dispatch may be detached.
    pub fn toggle_recording(&mut self) -> Dispatch {
        let dispatch = self.remote.notify_backend(RemoteAction::ToggleRecording);

        let recording = !self.state.recording;
        self.state.recording = recording;
        self.bootstrap.recording = recording;

        tracing::info!(recording, "Recording toggled");
        dispatch
    }

    pub fn alert_success(&mut self, message: impl Into<String>) {
        self.set_alert(AlertKind::Success, message.into(), SUCCESS_AUTO_CLOSE_MS, None, None);
    }

    pub fn alert_error(&mut self, message: impl Into<String>) {
        self.set_alert(AlertKind::Error, message.into(), 0, None, None);
    }

    /// Show a confirmation; `proceed` runs on confirm, `cancel` on cancel.
    pub fn alert_confirm(
        &mut self,
        message: impl Into<String>,
        proceed: AlertCallback,
        cancel: Option<AlertCallback>,
    ) {
        self.set_alert(AlertKind::Confirmation, message.into(), 0, Some(proceed), cancel);
    }

    pub fn confirm_alert(&mut self) {
        let alert = std::mem::take(&mut self.state.alert);
        if let Some(proceed) = alert.confirmation_proceed {
            proceed();
        }
    }

    pub fn cancel_alert(&mut self) {
        let alert = std::mem::take(&mut self.state.alert);
        if let Some(cancel) = alert.confirmation_cancel {
            cancel();
        }
    }

    /// Close the alert without running callbacks
    pub fn dismiss_alert(&mut self) {
        self.state.alert = Alert::default();
    }

    /// Close an auto-closing alert whose delay has passed at `now`.
    ///
    /// Returns whether an alert was closed.
    pub fn expire_alert(&mut self, now: Instant) -> bool {
        if !self.state.alert.is_expired(now) {
            return false;
        }
        tracing::debug!(kind = ?self.state.alert.kind, "Alert closed itself");
        self.dismiss_alert();
        true
    }

    fn set_alert(
        &mut self,
        kind: AlertKind,
        message: String,
        auto_close: u64,
        proceed: Option<AlertCallback>,
        cancel: Option<AlertCallback>,
    ) {
        if self.state.alert.is_active() {
            tracing::debug!(replaced = ?self.state.alert.kind, "Replacing active alert");
        }
        self.state.alert = Alert {
            kind: Some(kind),
            auto_close,
            message,
            opened_at: Some(Instant::now()),
            confirmation_proceed: proceed,
            confirmation_cancel: cancel,
        };
    }
}
