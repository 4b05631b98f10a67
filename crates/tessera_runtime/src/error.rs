//! # Runtime Error Types
//!
//! All errors that can occur in the runtime collaborators.

use thiserror::Error;

/// Errors that can occur in the runtime collaborators.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Reading or writing a config file failed.
    #[error("config i/o on {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A value could not be encoded for the config file.
    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// No section with this name.
    #[error("filter not found: {0}")]
    FilterNotFound(String),

    /// The section exists but has no such key.
    #[error("key not found: {key} in filter: {filter}")]
    KeyNotFound {
        /// Section searched.
        filter: String,
        /// Missing key.
        key: String,
    },

    /// The stored value cannot be converted to the requested type.
    #[error("invalid value for key: {key} in filter: {filter}: {reason}")]
    InvalidValue {
        /// Section of the value.
        filter: String,
        /// Key of the value.
        key: String,
        /// What went wrong.
        reason: String,
    },

    /// The background thread for a timer could not be started.
    #[error("failed to spawn timer thread: {0}")]
    TimerSpawn(#[source] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
