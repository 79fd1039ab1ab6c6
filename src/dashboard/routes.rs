//! Route Table
//!
//! Static, ordered list of dashboard routes. The router walks it top to
//! bottom and activates the first entry whose pattern matches.

use std::fmt;

use super::router::{RouteParams, RouterError};
use super::screen::{self, ViewFactory};

/// What an entry does when it matches
#[derive(Clone, Copy)]
pub enum RouteTarget {
    /// Render the view built by the factory
    View(ViewFactory),
    /// Re-resolve against another path
    Redirect(&'static str),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::View(_) => f.write_str("View(..)"),
            RouteTarget::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
        }
    }
}

/// One navigable path
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    /// Pattern such as `/processes/:id`
    pub path: &'static str,
    /// Symbolic name for programmatic navigation (redirects have none)
    pub name: Option<&'static str>,
    pub target: RouteTarget,
}

impl RouteEntry {
    pub const fn view(path: &'static str, name: &'static str, factory: ViewFactory) -> Self {
        Self {
            path,
            name: Some(name),
            target: RouteTarget::View(factory),
        }
    }

    pub const fn redirect(path: &'static str, to: &'static str) -> Self {
        Self {
            path,
            name: None,
            target: RouteTarget::Redirect(to),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.target, RouteTarget::Redirect(_))
    }

    /// Names of the `:param` segments in the pattern
    pub fn param_names(&self) -> impl Iterator<Item = &'static str> {
        segments(self.path).filter_map(|s| s.strip_prefix(':'))
    }

    /// Match a normalised path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut pattern = segments(self.path);
        let mut actual = segments(path);
        let mut params = RouteParams::default();

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(params),
                (Some(p), Some(a)) => {
                    if let Some(key) = p.strip_prefix(':') {
                        let value = urlencoding::decode(a)
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| a.to_string());
                        params.insert(key, value);
                    } else if p != a {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }

    /// Fill the pattern's parameters to produce a concrete path.
    pub fn build_path(&self, params: &RouteParams) -> Result<String, RouterError> {
        let mut path = String::new();
        for segment in segments(self.path) {
            path.push('/');
            match segment.strip_prefix(':') {
                Some(key) => {
                    let value = params
                        .get(key)
                        .ok_or_else(|| RouterError::MissingParam(key.to_string()))?;
                    path.push_str(&urlencoding::encode(value));
                }
                None => path.push_str(segment),
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

static ROUTES: [RouteEntry; 7] = [
    RouteEntry::redirect("/", "/processes"),
    RouteEntry::view("/processes/:id", "processes-preview", screen::process_preview),
    RouteEntry::view("/processes", "processes", screen::processes),
    RouteEntry::view("/queues", "queues", screen::queues),
    RouteEntry::view("/scheduled-jobs", "scheduled-jobs", screen::scheduled_jobs),
    RouteEntry::view("/retry-jobs", "retry-jobs", screen::retry_jobs),
    RouteEntry::view("/dead-jobs", "dead-jobs", screen::dead_jobs),
];

/// The dashboard's active routes, in match order
pub fn route_table() -> &'static [RouteEntry] {
    &ROUTES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_route_names_unique() {
        let names: Vec<_> = route_table().iter().filter_map(|r| r.name).collect();
        let distinct: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), distinct.len());
    }

    #[test]
    fn test_root_is_single_redirect() {
        let roots: Vec<_> = route_table()
            .iter()
            .filter(|r| r.matches("/").is_some())
            .collect();
        assert_eq!(roots.len(), 1);
        assert!(roots[0].is_redirect());
    }

    #[test]
    fn test_match_captures_id() {
        let entry = RouteEntry::view("/processes/:id", "processes-preview", screen::process_preview);
        let params = entry.matches("/processes/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert!(entry.matches("/processes").is_none());
        assert!(entry.matches("/processes/42/extra").is_none());
    }

    #[test]
    fn test_param_names() {
        let preview = RouteEntry::view("/processes/:id", "processes-preview", screen::process_preview);
        assert_eq!(preview.param_names().collect::<Vec<_>>(), vec!["id"]);

        let with_params: Vec<_> = route_table()
            .iter()
            .filter(|r| r.param_names().next().is_some())
            .filter_map(|r| r.name)
            .collect();
        assert_eq!(with_params, vec!["processes-preview"]);
    }

    #[test]
    fn test_match_decodes_param() {
        let entry = RouteEntry::view("/processes/:id", "processes-preview", screen::process_preview);
        let params = entry.matches("/processes/pool%20a").unwrap();
        assert_eq!(params.get("id"), Some("pool a"));
    }

    #[test]
    fn test_build_path() {
        let entry = RouteEntry::view("/processes/:id", "processes-preview", screen::process_preview);
        let params = RouteParams::default().with("id", "a b");
        assert_eq!(entry.build_path(&params).unwrap(), "/processes/a%20b");
        assert!(matches!(
            entry.build_path(&RouteParams::default()),
            Err(RouterError::MissingParam(_))
        ));
        assert_eq!(
            RouteEntry::redirect("/", "/processes")
                .build_path(&RouteParams::default())
                .unwrap(),
            "/"
        );
    }
}
