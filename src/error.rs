//! Error types shared across the pipeline.
//!
//! The pipeline distinguishes three failure classes:
//!
//! - [`FetchError`]: anything that goes wrong talking to a remote host. These
//!   are recorded as data (a broken link, a skipped source) and never abort
//!   a run.
//! - [`StorageError`]: reading or writing files under the output root. Loads
//!   fail open (an unreadable archive is treated as empty); writes are fatal.
//! - [`ConfigError`]: problems with the startup configuration, fatal before
//!   any network work begins.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single HTTP request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout(err.to_string());
        }
        if let Some(status) = err.status() {
            return FetchError::Status(status.as_u16());
        }
        FetchError::Network(err.to_string())
    }
}

/// Failure to read or write a file under the output root.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
