//! Route table.
//!
//! # Responsibilities
//! - Store registered handlers keyed by (verb, path)
//! - Look up the endpoint for a request
//! - Enumerate the BEFORE/AFTER hooks applying to a request path
//!
//! # Design Decisions
//! - Built once at startup, immutable while serving (shared via Arc)
//! - Registering an existing (verb, path) replaces the handler in place;
//!   the last registration wins and the replacement is logged
//! - Endpoints are matched in registration order, first match wins
//! - Every matching hook runs, in registration order

use std::collections::HashMap;

use crate::endpoint::Verb;
use crate::http::adapter::Handler;
use crate::routing::matcher::PathPattern;

/// A handler attached under a verb and path.
#[derive(Clone)]
pub struct Route {
    pub verb: Verb,
    pub pattern: PathPattern,
    pub handler: Handler,
}

impl Route {
    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("verb", &self.verb)
            .field("path", &self.path())
            .field("handler", &self.handler.kind())
            .finish()
    }
}

/// (verb, path) key of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub verb: Verb,
    pub path: String,
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb, self.path)
    }
}

/// A route matched against a request, with its captured parameters.
pub struct Matched<'a> {
    pub route: &'a Route,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` under `verb` and `path`.
    ///
    /// Returns `true` if an earlier registration for the same key was replaced.
    pub fn register(&mut self, verb: Verb, path: impl Into<String>, handler: Handler) -> bool {
        let pattern = PathPattern::parse(path);
        if pattern.is_malformed() {
            tracing::warn!(
                verb = %verb,
                path = %pattern.as_str(),
                "Path does not start with '/', route will never match"
            );
        }

        let path = pattern.as_str().to_string();
        let route = Route {
            verb,
            pattern,
            handler,
        };

        let replaced = match self
            .routes
            .iter_mut()
            .find(|r| r.verb == verb && r.path() == path)
        {
            Some(existing) => {
                tracing::warn!(
                    verb = %verb,
                    path = %path,
                    "Route already registered, replacing earlier handler"
                );
                *existing = route;
                true
            }
            None => {
                self.routes.push(route);
                false
            }
        };

        tracing::info!("Registered {} {}", verb, path);
        replaced
    }

    /// Endpoint handling `verb` requests for `path`.
    pub fn find(&self, verb: Verb, path: &str) -> Option<Matched<'_>> {
        self.routes
            .iter()
            .filter(|r| r.verb == verb)
            .find_map(|route| route.pattern.match_path(path).map(|params| Matched { route, params }))
    }

    /// Hooks of kind `verb` (BEFORE or AFTER) applying to `path`.
    pub fn hooks<'a>(&'a self, verb: Verb, path: &'a str) -> impl Iterator<Item = Matched<'a>> + 'a {
        debug_assert!(verb.is_lifecycle_hook());
        self.routes
            .iter()
            .filter(move |r| r.verb == verb)
            .filter_map(move |route| route.pattern.match_path(path).map(|params| Matched { route, params }))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn keys(&self) -> Vec<RouteKey> {
        self.routes
            .iter()
            .map(|r| RouteKey {
                verb: r.verb,
                path: r.path().to_string(),
            })
            .collect()
    }

    pub fn contains(&self, verb: Verb, path: &str) -> bool {
        self.routes.iter().any(|r| r.verb == verb && r.path() == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Reply, ReturnKind};

    fn text(body: &'static str) -> Handler {
        Handler::value(move |_| Ok(Some(Reply::Text(body.to_string()))))
    }

    fn noop() -> Handler {
        Handler::void(|_| Ok(()))
    }

    #[test]
    fn test_last_registration_wins() {
        let mut table = RouteTable::new();
        assert!(!table.register(Verb::Get, "/x", text("first")));
        assert!(!table.register(Verb::Post, "/x", noop()));
        assert!(table.register(Verb::Get, "/x", noop()));

        assert_eq!(table.len(), 2);
        let matched = table.find(Verb::Get, "/x").unwrap();
        assert_eq!(matched.route.handler.kind(), ReturnKind::Unit);
    }

    #[test]
    fn test_find_by_verb_and_params() {
        let mut table = RouteTable::new();
        table.register(Verb::Get, "/items/{id}", text("item"));
        table.register(Verb::Delete, "/items/:id", noop());

        let matched = table.find(Verb::Get, "/items/42").unwrap();
        assert_eq!(matched.route.path(), "/items/{id}");
        assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));

        assert!(table.find(Verb::Delete, "/items/42").is_some());
        assert!(table.find(Verb::Put, "/items/42").is_none());
        assert!(table.find(Verb::Get, "/items").is_none());
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let mut table = RouteTable::new();
        table.register(Verb::Get, "/files/*", text("any"));
        table.register(Verb::Get, "/files/readme", text("readme"));

        let matched = table.find(Verb::Get, "/files/readme").unwrap();
        assert_eq!(matched.route.path(), "/files/*");
    }

    #[test]
    fn test_hooks_in_registration_order() {
        let mut table = RouteTable::new();
        table.register(Verb::Before, "/*", noop());
        table.register(Verb::Before, "/admin/*", noop());
        table.register(Verb::After, "/*", noop());
        table.register(Verb::Get, "/admin/users", text("users"));

        let before: Vec<_> = table.hooks(Verb::Before, "/admin/users").map(|m| m.route.path()).collect();
        assert_eq!(before, vec!["/*", "/admin/*"]);

        let public: Vec<_> = table.hooks(Verb::Before, "/public").map(|m| m.route.path()).collect();
        assert_eq!(public, vec!["/*"]);

        assert_eq!(table.hooks(Verb::After, "/anything").count(), 1);
    }

    #[test]
    fn test_malformed_path_is_kept_but_unreachable() {
        let mut table = RouteTable::new();
        table.register(Verb::Get, "items", text("x"));

        assert!(table.contains(Verb::Get, "items"));
        assert!(table.find(Verb::Get, "/items").is_none());
        assert_eq!(table.keys()[0].to_string(), "GET items");
    }
}
