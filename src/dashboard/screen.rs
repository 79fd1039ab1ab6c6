//! Screens
//!
//! The views a route can activate. Each route entry carries a factory that
//! builds one of these from the captured parameters.

use std::fmt;

use super::router::{RouteParams, RouterError};

/// A renderable dashboard view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Worker pool overview
    Processes,
    /// A single worker pool
    ProcessPreview { id: String },
    Queues,
    ScheduledJobs,
    RetryJobs,
    DeadJobs,
    /// Fallback for fragments no route matches
    NotFound { path: String },
}

/// Builds a screen from route parameters
pub type ViewFactory = fn(&RouteParams) -> Result<Screen, RouterError>;

impl Screen {
    /// Heading shown above the view
    pub fn title(&self) -> String {
        match self {
            Screen::Processes => "Processes".to_string(),
            Screen::ProcessPreview { id } => format!("Process {}", id),
            Screen::Queues => "Queues".to_string(),
            Screen::ScheduledJobs => "Scheduled Jobs".to_string(),
            Screen::RetryJobs => "Retry Jobs".to_string(),
            Screen::DeadJobs => "Dead Jobs".to_string(),
            Screen::NotFound { .. } => "Page Not Found".to_string(),
        }
    }

    /// Job API resource this screen loads, relative to the API prefix.
    pub fn resource(&self) -> Option<&'static str> {
        match self {
            Screen::Processes | Screen::ProcessPreview { .. } => Some("worker_pools"),
            Screen::Queues => Some("queues"),
            Screen::ScheduledJobs => Some("scheduled_jobs"),
            Screen::RetryJobs => Some("retry_jobs"),
            Screen::DeadJobs => Some("dead_jobs"),
            Screen::NotFound { .. } => None,
        }
    }

    /// Whether the resource is served in pages
    pub fn is_paginated(&self) -> bool {
        matches!(
            self,
            Screen::ScheduledJobs | Screen::RetryJobs | Screen::DeadJobs
        )
    }

    /// Full URL path of the data this screen loads.
    pub fn data_path(&self, api_path: &str, page: Option<u32>) -> Option<String> {
        let resource = self.resource()?;
        let mut path = format!("{}/{}", api_path.trim_end_matches('/'), resource);
        if let (true, Some(page)) = (self.is_paginated(), page) {
            path.push_str(&format!("?page={}", page));
        }
        Some(path)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

pub(crate) fn processes(_: &RouteParams) -> Result<Screen, RouterError> {
    Ok(Screen::Processes)
}

pub(crate) fn process_preview(params: &RouteParams) -> Result<Screen, RouterError> {
    let id = params
        .get("id")
        .ok_or_else(|| RouterError::MissingParam("id".to_string()))?;
    Ok(Screen::ProcessPreview { id: id.to_string() })
}

pub(crate) fn queues(_: &RouteParams) -> Result<Screen, RouterError> {
    Ok(Screen::Queues)
}

pub(crate) fn scheduled_jobs(_: &RouteParams) -> Result<Screen, RouterError> {
    Ok(Screen::ScheduledJobs)
}

pub(crate) fn retry_jobs(_: &RouteParams) -> Result<Screen, RouterError> {
    Ok(Screen::RetryJobs)
}

pub(crate) fn dead_jobs(_: &RouteParams) -> Result<Screen, RouterError> {
    Ok(Screen::DeadJobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path() {
        assert_eq!(
            Screen::Queues.data_path("/microscope/api/", None).as_deref(),
            Some("/microscope/api/queues")
        );
        assert_eq!(
            Screen::DeadJobs.data_path("/api/", Some(2)).as_deref(),
            Some("/api/dead_jobs?page=2")
        );
        // page only applies to paginated screens
        assert_eq!(
            Screen::Processes.data_path("/api/", Some(2)).as_deref(),
            Some("/api/worker_pools")
        );
        assert_eq!(
            Screen::NotFound { path: "/x".into() }.data_path("/api/", None),
            None
        );
    }

    #[test]
    fn test_preview_requires_id() {
        let params = RouteParams::default();
        assert!(matches!(
            process_preview(&params),
            Err(RouterError::MissingParam(_))
        ));
    }
}
