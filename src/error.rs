//! Error types for festboard
//!
//! All modules use `FestResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for festboard operations
pub type FestResult<T> = Result<T, FestError>;

/// All errors that can occur in festboard
#[derive(Error, Debug)]
pub enum FestError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigValue { key: String, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Results store errors
    #[error("Results changed remotely (expected version {expected}, found {found}); reload before writing")]
    StoreConflict { expected: String, found: String },

    #[error("Malformed results envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Results store key not configured")]
    StoreKeyMissing,

    // Admin errors
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("No result at index {index} ({len} results published)")]
    ResultIndex { index: usize, len: usize },

    #[error("Incorrect admin password")]
    AdminDenied,

    #[error("Admin commands are disabled: no admin password configured")]
    AdminDisabled,

    // Cache errors
    #[error("Cache install of generation {generation} failed: {reason}")]
    CacheInstall { generation: String, reason: String },

    #[error("Cache entry {key} is corrupt: {reason}")]
    CacheCorrupt { key: String, reason: String },

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

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl FestError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure came from the network rather than local state
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StoreConflict { .. } => {
                Some("Another operator published first. Re-run the command to work on fresh data")
            }
            Self::StoreKeyMissing => Some("Set store.api_key or FESTBOARD_STORE_KEY"),
            Self::AdminDisabled => Some("Set admin.password in the config file"),
            Self::Network { .. } => Some("Check your connection; nothing was retried"),
            _ => None,
        }
    }
}
