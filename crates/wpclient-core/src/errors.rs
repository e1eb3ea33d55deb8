//! Session-level errors.
//!
//! Per-invocation pipeline failures are `pipeline::OpenError`; gateway failures are
//! `gateway::GatewayError`. `ClientError` covers misuse of the client and session lifecycle
//! I/O (creating or removing the cache directory).

use std::path::PathBuf;

use thiserror::Error;

use crate::gateway::GatewayError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("client is shutting down; no new work is accepted")]
    ShuttingDown,

    #[error("action not enabled: {0}")]
    NotEnabled(&'static str),

    #[error("cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl ClientError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn cache_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheDir {
            path: path.into(),
            source,
        }
    }
}
