//! Namespace scanning.
//!
//! # Responsibilities
//! - Parse namespace identifiers (`a::b::c` or `a.b.c`)
//! - Derive a namespace from a representative value's type path
//! - Collect every endpoint declared in a namespace and its sub-namespaces
//!
//! # Design Decisions
//! - A malformed or unknown identifier yields no endpoints and a warning,
//!   never an error: callers see zero registrations
//! - Result order follows the catalog but callers must not rely on it

use std::fmt;

use crate::discovery::namespace::{Catalog, DiscoveredEndpoint};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("empty namespace identifier")]
    Empty,

    #[error("invalid segment '{segment}' in namespace '{id}'")]
    InvalidSegment { id: String, segment: String },
}

/// Parsed namespace identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceId {
    segments: Vec<String>,
}

impl NamespaceId {
    pub fn parse(id: &str) -> Result<Self, ScanError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ScanError::Empty);
        }

        let segments = id
            .split("::")
            .flat_map(|part| part.split('.'))
            .map(|segment| {
                if is_identifier(segment) {
                    Ok(segment.to_string())
                } else {
                    Err(ScanError::InvalidSegment {
                        id: id.to_string(),
                        segment: segment.to_string(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// True if `self` equals `parent` or is nested under it.
    pub fn is_within(&self, parent: &NamespaceId) -> bool {
        self.segments.starts_with(&parent.segments)
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// What to scan: an identifier, or the namespace of a value's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Namespace(String),
    /// Full type path of a representative value.
    Type(&'static str),
}

impl Source {
    /// Namespace declaring the type of `value`.
    pub fn of<T: ?Sized>(_value: &T) -> Self {
        Source::Type(std::any::type_name::<T>())
    }

    /// Namespace declaring `T`.
    pub fn type_of<T: ?Sized>() -> Self {
        Source::Type(std::any::type_name::<T>())
    }

    /// Namespace identifier this source designates.
    pub fn namespace(&self) -> String {
        match self {
            Source::Namespace(id) => id.clone(),
            Source::Type(type_name) => module_of(type_name).to_string(),
        }
    }
}

impl From<&str> for Source {
    fn from(id: &str) -> Self {
        Source::Namespace(id.to_string())
    }
}

impl From<String> for Source {
    fn from(id: String) -> Self {
        Source::Namespace(id)
    }
}

/// Module path of a type path: generics and the type name stripped.
fn module_of(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let base = base.trim_start_matches('&').trim_start_matches("mut ");
    match base.rfind("::") {
        Some(idx) => &base[..idx],
        None => "",
    }
}

/// Every endpoint declared under `source`'s namespace.
pub fn scan(catalog: &Catalog, source: &Source) -> Vec<DiscoveredEndpoint> {
    let raw = source.namespace();
    let id = match NamespaceId::parse(&raw) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(namespace = %raw, error = %e, "Namespace scan failed, no endpoints registered");
            return Vec::new();
        }
    };

    let found: Vec<DiscoveredEndpoint> = catalog
        .within(&id)
        .flat_map(|ns| ns.endpoints().iter().cloned())
        .collect();

    if found.is_empty() {
        tracing::warn!(namespace = %id, "No endpoints found in namespace");
    } else {
        tracing::debug!(namespace = %id, count = found.len(), "Namespace scanned");
    }
    found
}
