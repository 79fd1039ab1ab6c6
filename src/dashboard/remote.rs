//! Remote Control
//!
//! Fire-and-forget notifications from the shell to the backend. The request
//! is already in flight when `notify_backend` returns; the returned
//! [`Dispatch`] can be detached or awaited, and the shell never depends on it.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use super::bootstrap::BootstrapConfig;

/// Backend actions the shell can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    ToggleRecording,
}

impl RemoteAction {
    /// Endpoint path for this action under the given base path
    pub fn path(&self, base_path: &str) -> String {
        match self {
            RemoteAction::ToggleRecording => {
                format!("{}/microscope-api/toggle-recording", base_path)
            }
        }
    }
}

/// Remote control errors
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend responded with status {0}")]
    Status(u16),

    #[error("No async runtime to send the request on")]
    NoRuntime,

    #[error("Failed to start the request runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Dispatch task failed: {0}")]
    Task(String),

    #[error("Timed out waiting for the backend")]
    Timeout,
}

enum DispatchState {
    Running(JoinHandle<Result<(), RemoteError>>),
    Unsent(RemoteError),
}

/// Handle to a notification that is already on its way
pub struct Dispatch {
    state: DispatchState,
}

impl Dispatch {
    /// Start `request` on the current tokio runtime.
    pub fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let state = match tokio::runtime::Handle::try_current() {
            Ok(handle) => DispatchState::Running(handle.spawn(request)),
            Err(_) => {
                tracing::warn!("No tokio runtime, backend notification dropped");
                DispatchState::Unsent(RemoteError::NoRuntime)
            }
        };
        Self { state }
    }

    /// Start `request` on the runtime behind `handle`.
    pub fn spawn_on<F>(handle: &Handle, request: F) -> Self
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        Self {
            state: DispatchState::Running(handle.spawn(request)),
        }
    }

    /// A dispatch that failed before anything was sent
    pub fn failed(error: RemoteError) -> Self {
        Self {
            state: DispatchState::Unsent(error),
        }
    }

    /// Stop tracking the request; it keeps running.
    pub fn detach(self) {}

    pub fn is_finished(&self) -> bool {
        match &self.state {
            DispatchState::Running(handle) => handle.is_finished(),
            DispatchState::Unsent(_) => true,
        }
    }

    /// Wait for the backend's answer
    pub async fn wait(self) -> Result<(), RemoteError> {
        match self.state {
            DispatchState::Running(handle) => handle
                .await
                .map_err(|e| RemoteError::Task(e.to_string()))?,
            DispatchState::Unsent(error) => Err(error),
        }
    }

    /// Wait at most `limit` for the backend's answer
    pub async fn wait_timeout(self, limit: Duration) -> Result<(), RemoteError> {
        tokio::time::timeout(limit, self.wait())
            .await
            .map_err(|_| RemoteError::Timeout)?
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Something that can tell the backend about a shell action
pub trait RemoteControl: Send + Sync {
    fn notify_backend(&self, action: RemoteAction) -> Dispatch;
}

/// Remote control over HTTP
///
/// Requests run on the runtime that was current at construction. Built
/// outside any runtime, it starts a small one of its own, so notifications
/// go out from synchronous callers too.
pub struct HttpRemoteControl {
    client: reqwest::Client,
    server_url: String,
    base_path: String,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl HttpRemoteControl {
    /// `server_url` is the origin (e.g. `http://localhost:8888`); the mount
    /// path comes from the startup configuration.
    pub fn new(
        server_url: impl Into<String>,
        bootstrap: &BootstrapConfig,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let (handle, runtime) = match Handle::try_current() {
            Ok(handle) => (handle, None),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("microscope-remote")
                    .enable_all()
                    .build()?;
                tracing::debug!("Started dedicated runtime for backend notifications");
                (runtime.handle().clone(), Some(runtime))
            }
        };

        let client = {
            let _guard = handle.enter();
            reqwest::Client::builder().timeout(timeout).build()?
        };

        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            base_path: bootstrap.base_path(),
            handle,
            runtime,
        })
    }

    /// Whether requests run on a runtime this control started itself
    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn url_for(&self, action: RemoteAction) -> String {
        format!("{}{}", self.server_url, action.path(&self.base_path))
    }
}

impl RemoteControl for HttpRemoteControl {
    fn notify_backend(&self, action: RemoteAction) -> Dispatch {
        let url = self.url_for(action);
        let request = self.client.post(&url);

        Dispatch::spawn_on(&self.handle, async move {
            let result = match request.send().await {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => Err(RemoteError::Status(response.status().as_u16())),
                Err(e) => Err(RemoteError::Request(e)),
            };
            match &result {
                Ok(()) => tracing::debug!(url = %url, ?action, "Backend notified"),
                Err(e) => tracing::warn!(url = %url, ?action, error = %e, "Backend notification failed"),
            }
            result
        })
    }
}

impl Drop for HttpRemoteControl {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_path() {
        assert_eq!(
            RemoteAction::ToggleRecording.path("/microscope"),
            "/microscope/microscope-api/toggle-recording"
        );
        assert_eq!(
            RemoteAction::ToggleRecording.path(""),
            "/microscope-api/toggle-recording"
        );
    }

    #[test]
    fn test_http_url() {
        let bootstrap = BootstrapConfig::new("UTC", "dashboard", false);
        let remote =
            HttpRemoteControl::new("http://localhost:8888/", &bootstrap, Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            remote.url_for(RemoteAction::ToggleRecording),
            "http://localhost:8888/dashboard/microscope-api/toggle-recording"
        );
    }

    #[test]
    fn test_spawn_without_runtime() {
        let dispatch = Dispatch::spawn(async { Ok::<(), RemoteError>(()) });
        assert!(dispatch.is_finished());
    }

    #[tokio::test]
    async fn test_wait_timeout_on_pending_request() {
        let dispatch = Dispatch::spawn(std::future::pending::<Result<(), RemoteError>>());
        assert!(!dispatch.is_finished());
        let result = dispatch.wait_timeout(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(RemoteError::Timeout)));
    }

    #[test]
    fn test_sync_caller_still_reaches_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let remote =
            HttpRemoteControl::new(url, &BootstrapConfig::default(), Duration::from_secs(2))
                .unwrap();
        assert!(remote.owns_runtime());
        remote.notify_backend(RemoteAction::ToggleRecording).detach();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let connected = loop {
            match listener.accept() {
                Ok(_) => break true,
                Err(_) if std::time::Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break false,
            }
        };
        assert!(connected);
    }

    #[tokio::test]
    async fn test_uses_ambient_runtime() {
        let remote = HttpRemoteControl::new(
            "http://localhost:8888",
            &BootstrapConfig::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!remote.owns_runtime());
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_error() {
        let bootstrap = BootstrapConfig::default();
        let remote =
            HttpRemoteControl::new("http://127.0.0.1:9", &bootstrap, Duration::from_millis(500))
                .unwrap();
        let result = remote
            .notify_backend(RemoteAction::ToggleRecording)
            .wait()
            .await;
        assert!(result.is_err());
    }
}
