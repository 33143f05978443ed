//! Error types for routebind.

use thiserror::Error;

use crate::config::ConfigError;
use crate::endpoint::Verb;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An endpoint method has a shape the adapter cannot wrap.
    #[error("Invalid endpoint {verb} {path}: {reason}")]
    Configuration {
        path: String,
        verb: Verb,
        reason: String,
    },

    /// The declaring controller could not be constructed.
    #[error("Could not prepare endpoint '{path}' with method '{verb}': {source}")]
    Instantiation {
        path: String,
        verb: Verb,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(path: impl Into<String>, verb: Verb, reason: impl Into<String>) -> Self {
        Error::Configuration {
            path: path.into(),
            verb,
            reason: reason.into(),
        }
    }
}

/// Failure while running an endpoint method or serializing its result.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Endpoint method failed: {0}")]
    Failed(BoxError),

    #[error("Failed to serialize endpoint result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Endpoint method panicked")]
    Panicked,
}
