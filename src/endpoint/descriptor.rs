//! Endpoint descriptors.
//!
//! A descriptor is the declarative part of an endpoint: the path fragment and
//! the verb it answers to. Descriptors are attached to endpoint methods and,
//! optionally, to the controller type itself, in which case only the path is
//! used (as a prefix for every method of that type).
//!
//! Nothing is validated here. Malformed paths are carried as-is and only
//! surface when the route table tries to match them.

use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// HTTP verb or lifecycle hook an endpoint is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Runs before endpoint matching for every request whose path matches.
    Before,
    /// Runs after the endpoint for every request whose path matches.
    After,
}

impl Verb {
    pub const ALL: [Verb; 9] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Head,
        Verb::Options,
        Verb::Before,
        Verb::After,
    ];

    /// Upper-case name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Before => "BEFORE",
            Verb::After => "AFTER",
        }
    }

    /// Parse a verb name, case-insensitively.
    ///
    /// Unrecognized names fall back to `GET`.
    pub fn from_name(name: &str) -> Verb {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_else(|| {
                tracing::warn!(verb = %name, "Unrecognized verb, registering as GET");
                Verb::Get
            })
    }

    /// True for `BEFORE` and `AFTER`.
    pub fn is_lifecycle_hook(&self) -> bool {
        matches!(self, Verb::Before | Verb::After)
    }

    /// The verb an incoming request method is routed under.
    ///
    /// Returns `None` for methods no endpoint can be registered for
    /// (CONNECT, TRACE, extensions).
    pub fn for_request(method: &Method) -> Option<Verb> {
        [
            (Method::GET, Verb::Get),
            (Method::POST, Verb::Post),
            (Method::PUT, Verb::Put),
            (Method::PATCH, Verb::Patch),
            (Method::DELETE, Verb::Delete),
            (Method::HEAD, Verb::Head),
            (Method::OPTIONS, Verb::Options),
        ]
        .into_iter()
        .find(|(m, _)| m == method)
        .map(|(_, verb)| verb)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Verb {
    fn from(name: &str) -> Self {
        Verb::from_name(name)
    }
}

/// Path fragment plus verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub path: String,
    #[serde(default)]
    pub verb: Verb,
}

impl EndpointDescriptor {
    /// Descriptor for `path` with the default verb (`GET`).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            verb: Verb::default(),
        }
    }

    pub fn with_verb(mut self, verb: impl Into<Verb>) -> Self {
        self.verb = verb.into();
        self
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Get)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Post)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Put)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Patch)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Delete)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Head)
    }

    pub fn options(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Options)
    }

    pub fn before(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::Before)
    }

    pub fn after(path: impl Into<String>) -> Self {
        Self::new(path).with_verb(Verb::After)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_verb_is_get() {
        let d = EndpointDescriptor::new("/items");
        assert_eq!(d.verb, Verb::Get);
        assert_eq!(d.path, "/items");
    }

    #[test]
    fn test_verb_from_name() {
        assert_eq!(Verb::from_name("post"), Verb::Post);
        assert_eq!(Verb::from_name("OPTIONS"), Verb::Options);
        assert_eq!(Verb::from_name(" before "), Verb::Before);
        // Unknown names map to GET
        assert_eq!(Verb::from_name("PURGE"), Verb::Get);
        assert_eq!(Verb::from(""), Verb::Get);
    }

    #[test]
    fn test_verb_for_request() {
        assert_eq!(Verb::for_request(&Method::DELETE), Some(Verb::Delete));
        assert_eq!(Verb::for_request(&Method::TRACE), None);
    }

    #[test]
    fn test_descriptor_deserializes_with_default_verb() {
        let d: EndpointDescriptor = serde_json::from_str(r#"{"path":"/x"}"#).unwrap();
        assert_eq!(d, EndpointDescriptor::get("/x"));

        let d: EndpointDescriptor =
            serde_json::from_str(r#"{"path":"/x","verb":"PATCH"}"#).unwrap();
        assert_eq!(d.verb, Verb::Patch);
    }
}
