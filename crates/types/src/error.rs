//! Error taxonomy for mapping loads and resolution.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse classification of a [`MappingError`].
///
/// Hosts translate these into their own signalling conventions; the kind is
/// what decides whether a failure is fatal for the session or only for the
/// current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Mapping configuration or files are missing or malformed.
    Configuration,
    /// Nothing is mapped for the requested facility, schema or path.
    Lookup,
    /// A mapping rule failed while producing its value.
    Transform,
    /// The request itself is unusable (empty path, negative index).
    InvalidRequest,
}

/// Main error type for mapping operations.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("configuration error: {message}")]
    Configuration { message: String, path: Option<PathBuf> },

    #[error("lookup error: {message}")]
    Lookup { message: String },

    #[error("transform error in '{key}': {message}")]
    Transform { key: String, message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl MappingError {
    /// Create a configuration error that is not tied to a file.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error for a specific file.
    pub fn configuration_at(path: &Path, message: impl Into<String>) -> Self {
        Self::Configuration {
            message: format!("{}: {}", path.display(), message.into()),
            path: Some(path.to_path_buf()),
        }
    }

    /// Create a lookup error.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup { message: message.into() }
    }

    /// Create a transform error for the entry stored under `key`.
    pub fn transform(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Lookup { .. } => ErrorKind::Lookup,
            Self::Transform { .. } => ErrorKind::Transform,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// Whether the failure invalidates the session rather than one request.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }
}
