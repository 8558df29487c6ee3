//! Error types for offgrid
//!
//! All modules use `OffgridResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for offgrid operations
pub type OffgridResult<T> = Result<T, OffgridError>;

/// All errors that can occur in offgrid
#[derive(Error, Debug)]
pub enum OffgridError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Request errors
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Unknown request destination: {0}")]
    UnknownDestination(String),

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Network is offline, cannot fetch {0}")]
    Offline(String),

    #[error("Precache rejected {url}: server answered {status}")]
    PrecacheRejected { url: String, status: u16 },

    #[error("{url} is not cached and the network is unavailable")]
    Unavailable {
        url: String,
        #[source]
        source: Box<OffgridError>,
    },

    // Cache errors
    #[error("Cache bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Cache storage error: {0}")]
    Storage(String),

    // Lifecycle errors
    #[error("Invalid worker state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl OffgridError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a fetch failure that no cache entry could cover
    pub fn unavailable(url: impl Into<String>, source: OffgridError) -> Self {
        Self::Unavailable {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Whether the error came from the network layer
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Offline(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: offgrid config init --force"),
            Self::InvalidUrl { .. } => Some("Check agent.origin in your config"),
            Self::Network { .. } => Some("Is the origin server running?"),
            Self::Unavailable { .. } => {
                Some("Only pre-cached and previously fetched assets are served offline")
            }
            _ => None,
        }
    }
}
