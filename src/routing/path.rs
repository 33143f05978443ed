//! Path composition.
//!
//! Textual concatenation, not URL normalization: one trailing `/` is stripped
//! from the prefix and the method path is appended verbatim. A method path
//! without a leading `/` yields a malformed route that is still registered.

use crate::endpoint::EndpointDescriptor;

/// Join an optional type-level prefix with a method path.
pub fn resolve_path(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(prefix) => {
            let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
            format!("{}{}", prefix, path)
        }
        None => path.to_string(),
    }
}

/// Full path for a method descriptor declared on a type with `type_descriptor`.
pub fn resolve(type_descriptor: Option<&EndpointDescriptor>, method: &EndpointDescriptor) -> String {
    resolve_path(type_descriptor.map(|d| d.path.as_str()), &method.path)
}
