//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse registered paths into segment patterns
//! - Match request paths, capturing path parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `{name}` and `:name` capture exactly one non-empty segment
//! - `*` as the last segment matches the remainder (possibly empty);
//!   elsewhere it matches any single segment
//! - A trailing `/` is ignored on both sides, except for the root path
//! - A pattern not starting with `/` is kept but never matches
//! - No regex to guarantee O(n) matching

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled route path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    malformed: bool,
}

impl PathPattern {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let malformed = !raw.starts_with('/');
        let segments = split(&raw)
            .map(|s| {
                if s == "*" {
                    Segment::Wildcard
                } else if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Segment::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix(':').filter(|n| !n.is_empty()) {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            raw,
            segments,
            malformed,
        }
    }

    /// The path as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern can never match a request path.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// Match `path`, returning the captured parameters on success.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        if self.malformed || !path.starts_with('/') {
            return None;
        }

        let parts: Vec<&str> = split(path).collect();
        let mut params = HashMap::new();
        let last = self.segments.len().saturating_sub(1);

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard if i == last => return Some(params),
                Segment::Wildcard => {
                    parts.get(i)?;
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|v| !v.is_empty())?;
                    params.insert(name.clone(), (*value).to_string());
                }
                Segment::Literal(expected) => {
                    if parts.get(i) != Some(&expected.as_str()) {
                        return None;
                    }
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

/// Segments of a path with the leading and one trailing `/` removed.
fn split(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let empty = trimmed.is_empty();
    trimmed.split('/').filter(move |_| !empty)
}
