//! Error types for topokit
//!
//! The first five variants form the closed taxonomy every coordination backend
//! must translate its own failures into. The rest are ambient failures of the
//! crate itself (configuration, encoding).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Contract Errors ===
    #[error("node doesn't exist: {0}")]
    NoNode(String),

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("deadline exceeded: {0}")]
    Timeout(String),

    #[error("no implementation: {0}")]
    NoImplementation(String),

    #[error("interrupted: {0}")]
    Interrupted(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Encoding Errors ===
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Closed set of error kinds callers are allowed to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoNode,
    NodeExists,
    Timeout,
    NoImplementation,
    Interrupted,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NoNode => write!(f, "no_node"),
            ErrorKind::NodeExists => write!(f, "node_exists"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::NoImplementation => write!(f, "no_implementation"),
            ErrorKind::Interrupted => write!(f, "interrupted"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoNode(_) => ErrorKind::NoNode,
            Error::NodeExists(_) => ErrorKind::NodeExists,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::NoImplementation(_) => ErrorKind::NoImplementation,
            Error::Interrupted(_) => ErrorKind::Interrupted,
            _ => ErrorKind::Other,
        }
    }

    /// Is this error of the given kind?
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Is this a retryable error?
    ///
    /// A timed-out write may still have been committed, so a retry must
    /// re-read the path before assuming the write is lost.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
