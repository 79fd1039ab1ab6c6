//! Hash Router
//!
//! Resolves the fragment part of the dashboard URL against the route table.
//! The router is mounted under a base derived from the deployment mount path,
//! so links look like `/<mount>/#/processes/42`.

use std::collections::BTreeMap;
use thiserror::Error;

use super::bootstrap::BootstrapConfig;
use super::routes::{route_table, RouteEntry, RouteTarget};
use super::screen::Screen;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 8;

/// Router errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Duplicate route name: {0}")]
    DuplicateName(String),

    /// The table must send `/` somewhere through exactly one redirect
    #[error("Root path must be matched by exactly one redirect entry")]
    InvalidRoot,

    #[error("Unknown route name: {0}")]
    UnknownRoute(String),

    #[error("Missing route parameter: {0}")]
    MissingParam(String),

    #[error("Too many redirects while resolving {0}")]
    RedirectLoop(String),
}

/// Parameters captured from a path pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The view currently occupying the shell's view slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveView {
    /// Matched route name, `None` when nothing matched
    pub name: Option<&'static str>,
    /// Path after following redirects
    pub path: String,
    pub params: RouteParams,
    pub query: BTreeMap<String, String>,
    pub screen: Screen,
}

impl ActiveView {
    pub fn is_not_found(&self) -> bool {
        matches!(self.screen, Screen::NotFound { .. })
    }

    /// Path plus query string, as it appears after the `#`
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Fragment-addressed router over a validated route table
#[derive(Debug)]
pub struct Router {
    routes: Vec<RouteEntry>,
    base: String,
    location: String,
    current: Option<ActiveView>,
}

impl Router {
    /// Router over the dashboard's route table
    pub fn new(bootstrap: &BootstrapConfig) -> Result<Self, RouterError> {
        Self::with_routes(route_table(), bootstrap)
    }

    /// Router over a custom table; the table is validated here.
    pub fn with_routes(routes: &[RouteEntry], bootstrap: &BootstrapConfig) -> Result<Self, RouterError> {
        validate(routes)?;
        Ok(Self {
            routes: routes.to_vec(),
            base: bootstrap.router_base(),
            location: "/".to_string(),
            current: None,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Current fragment (without the `#`)
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn current(&self) -> Option<&ActiveView> {
        self.current.as_ref()
    }

    /// Resolve a fragment to the view it activates.
    ///
    /// Fragments no entry matches resolve to [`Screen::NotFound`].
    pub fn resolve(&self, fragment: &str) -> Result<ActiveView, RouterError> {
        let (mut path, query) = split_fragment(fragment);

        for _ in 0..=MAX_REDIRECTS {
            let matched = self
                .routes
                .iter()
                .find_map(|entry| entry.matches(&path).map(|params| (entry, params)));

            let Some((entry, params)) = matched else {
                return Ok(ActiveView {
                    name: None,
                    path: path.clone(),
                    params: RouteParams::default(),
                    query,
                    screen: Screen::NotFound { path },
                });
            };

            match entry.target {
                RouteTarget::Redirect(to) => {
                    path = normalize_path(to);
                }
                RouteTarget::View(factory) => {
                    let screen = factory(&params)?;
                    return Ok(ActiveView {
                        name: entry.name,
                        path,
                        params,
                        query,
                        screen,
                    });
                }
            }
        }

        Err(RouterError::RedirectLoop(fragment.to_string()))
    }

    /// Concrete path for a named route
    pub fn path_for(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
        self.routes
            .iter()
            .find(|entry| entry.name == Some(name))
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?
            .build_path(params)
    }

    /// Link to a named route, including the router base
    pub fn href(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
        Ok(format!("{}#{}", self.base, self.path_for(name, params)?))
    }

    /// Programmatic transition to a named route.
    pub fn navigate(&mut self, name: &str, params: &RouteParams) -> Result<&ActiveView, RouterError> {
        let path = self.path_for(name, params)?;
        self.push(&path)
    }

    /// Move to a fragment and activate whatever it resolves to.
    pub fn push(&mut self, fragment: &str) -> Result<&ActiveView, RouterError> {
        let view = self.resolve(fragment)?;
        tracing::debug!(
            from = %self.location,
            to = %view.full_path(),
            route = view.name.unwrap_or("<not found>"),
            "Route changed"
        );
        self.location = view.full_path();
        Ok(self.current.insert(view))
    }

    /// Activate a full location such as `/dashboard/#/queues`.
    pub fn sync(&mut self, location: &str) -> Result<&ActiveView, RouterError> {
        let fragment = match location.split_once('#') {
            Some((_, fragment)) => fragment,
            None if location.trim_end_matches('/') == self.base.trim_end_matches('/') => "/",
            None => location,
        };
        self.push(fragment)
    }
}

fn validate(routes: &[RouteEntry]) -> Result<(), RouterError> {
    let mut seen = std::collections::HashSet::new();
    for name in routes.iter().filter_map(|r| r.name) {
        if !seen.insert(name) {
            return Err(RouterError::DuplicateName(name.to_string()));
        }
    }

    let roots: Vec<&RouteEntry> = routes.iter().filter(|r| r.matches("/").is_some()).collect();
    match roots.as_slice() {
        [root] if root.is_redirect() => Ok(()),
        _ => Err(RouterError::InvalidRoot),
    }
}

fn split_fragment(fragment: &str) -> (String, BTreeMap<String, String>) {
    let fragment = fragment.trim_start_matches('#');
    let (path, query) = match fragment.split_once('?') {
        Some((path, query)) => (path, query),
        None => (fragment, ""),
    };

    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect();

    (normalize_path(path), query)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|v| v.into_owned())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::screen;

    fn router() -> Router {
        Router::new(&BootstrapConfig::default()).unwrap()
    }

    #[test]
    fn test_root_redirects_to_processes() {
        let router = router();
        let root = router.resolve("/").unwrap();
        let processes = router.resolve("/processes").unwrap();
        assert_eq!(root, processes);
        assert_eq!(root.name, Some("processes"));
        assert_eq!(router.resolve("").unwrap(), processes);
        assert_eq!(router.resolve("#/").unwrap(), processes);
    }

    #[test]
    fn test_preview_extracts_id() {
        let router = router();
        let view = router.resolve("/processes/42").unwrap();
        assert_eq!(view.name, Some("processes-preview"));
        assert_eq!(view.params.get("id"), Some("42"));
        assert_eq!(view.screen, Screen::ProcessPreview { id: "42".to_string() });

        let index = router.resolve("/processes").unwrap();
        assert_eq!(index.name, Some("processes"));
        assert!(index.params.is_empty());
    }

    #[test]
    fn test_trailing_slash_and_query() {
        let router = router();
        let view = router.resolve("/dead-jobs/?page=3&tag=a+b").unwrap();
        assert_eq!(view.name, Some("dead-jobs"));
        assert_eq!(view.query.get("page").map(String::as_str), Some("3"));
        assert_eq!(view.query.get("tag").map(String::as_str), Some("a b"));
        assert_eq!(view.full_path(), "/dead-jobs?page=3&tag=a%20b");
    }

    #[test]
    fn test_unmatched_fragment_is_not_found() {
        let router = router();
        let view = router.resolve("/exceptions").unwrap();
        assert!(view.is_not_found());
        assert_eq!(view.name, None);
        assert_eq!(view.screen, Screen::NotFound { path: "/exceptions".to_string() });
    }

    #[test]
    fn test_navigate_updates_location() {
        let mut router = router();
        let params = RouteParams::default().with("id", "pool-1");
        let view = router.navigate("processes-preview", &params).unwrap();
        assert_eq!(view.screen, Screen::ProcessPreview { id: "pool-1".to_string() });
        assert_eq!(router.location(), "/processes/pool-1");
        assert_eq!(router.current().and_then(|v| v.name), Some("processes-preview"));

        assert!(matches!(
            router.navigate("exceptions", &RouteParams::default()),
            Err(RouterError::UnknownRoute(_))
        ));
        assert!(matches!(
            router.navigate("processes-preview", &RouteParams::default()),
            Err(RouterError::MissingParam(_))
        ));
    }

    #[test]
    fn test_push_root_lands_on_redirect_target() {
        let mut router = router();
        router.push("/").unwrap();
        assert_eq!(router.location(), "/processes");
    }

    #[test]
    fn test_base_and_href() {
        let router = Router::new(&BootstrapConfig::new("UTC", "dashboard", false)).unwrap();
        assert_eq!(router.base(), "/dashboard/");
        assert_eq!(
            router.href("queues", &RouteParams::default()).unwrap(),
            "/dashboard/#/queues"
        );

        let root = Router::new(&BootstrapConfig::new("UTC", "", false)).unwrap();
        assert_eq!(root.base(), "/");
    }

    #[test]
    fn test_sync_full_location() {
        let mut router = Router::new(&BootstrapConfig::new("UTC", "dashboard", false)).unwrap();
        assert_eq!(router.sync("/dashboard/#/queues").unwrap().screen, Screen::Queues);
        assert_eq!(router.sync("/dashboard").unwrap().screen, Screen::Processes);
        assert_eq!(router.sync("/retry-jobs").unwrap().screen, Screen::RetryJobs);
    }

    #[test]
    fn test_validation_rejects_bad_tables() {
        let bootstrap = BootstrapConfig::default();
        let duplicate = [
            RouteEntry::redirect("/", "/a"),
            RouteEntry::view("/a", "a", screen::queues),
            RouteEntry::view("/b", "a", screen::queues),
        ];
        assert_eq!(
            Router::with_routes(&duplicate, &bootstrap).unwrap_err(),
            RouterError::DuplicateName("a".to_string())
        );

        let view_root = [RouteEntry::view("/", "home", screen::queues)];
        assert_eq!(
            Router::with_routes(&view_root, &bootstrap).unwrap_err(),
            RouterError::InvalidRoot
        );
    }

    #[test]
    fn test_router_keeps_table_order() {
        let router = Router::new(&BootstrapConfig::default()).unwrap();
        let paths: Vec<_> = router.routes().iter().map(|r| r.path).collect();
        let table: Vec<_> = route_table().iter().map(|r| r.path).collect();
        assert_eq!(paths, table);
        assert_eq!(paths[0], "/");
    }

    #[test]
    fn test_redirect_loop() {
        let routes = [
            RouteEntry::redirect("/", "/a"),
            RouteEntry::redirect("/a", "/b"),
            RouteEntry::redirect("/b", "/a"),
        ];
        let router = Router::with_routes(&routes, &BootstrapConfig::default()).unwrap();
        assert!(matches!(router.resolve("/"), Err(RouterError::RedirectLoop(_))));
    }
}
