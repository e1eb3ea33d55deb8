//! Terminal results of one fetch-open invocation.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::host::HostError;
use crate::model::{DocumentIdentifier, Region};
use crate::pipeline::Step;

/// Failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenErrorKind {
    NotConnected,
    NotFound,
    ConversionFailed,
    CacheWriteFailed,
    OpenFailed,
}

impl OpenErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenErrorKind::NotConnected => "not_connected",
            OpenErrorKind::NotFound => "not_found",
            OpenErrorKind::ConversionFailed => "conversion_failed",
            OpenErrorKind::CacheWriteFailed => "cache_write_failed",
            OpenErrorKind::OpenFailed => "open_failed",
        }
    }
}

/// A terminal pipeline failure. None of these are retried.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("cannot reach the pathway service while fetching {id}: {reason}")]
    NotConnected {
        id: DocumentIdentifier,
        reason: String,
    },

    #[error("pathway {id} not found: {detail}")]
    NotFound {
        id: DocumentIdentifier,
        detail: String,
    },

    #[error("pathway {id} could not be converted: {reason}")]
    ConversionFailed {
        id: DocumentIdentifier,
        reason: String,
    },

    #[error("cannot write cache entry {}", .path.display())]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("host failed to open {}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: HostError,
    },
}

impl OpenError {
    /// Classify a gateway failure raised by the fetch step.
    ///
    /// Transport and URL problems are `NotConnected`. An unknown id or a fault answering
    /// the fetch is `NotFound`. A body that does not decode is `ConversionFailed`.
    pub fn from_fetch(id: &DocumentIdentifier, err: GatewayError) -> Self {
        let id = id.clone();
        match err {
            GatewayError::NotConnected(reason) => OpenError::NotConnected { id, reason },
            GatewayError::Decode(reason) => OpenError::ConversionFailed { id, reason },
            GatewayError::NotFound(detail) | GatewayError::Service(detail) => {
                OpenError::NotFound { id, detail }
            }
            other @ (GatewayError::Unauthorized(_) | GatewayError::Unsupported(_)) => {
                OpenError::NotFound { id, detail: other.to_string() }
            }
        }
    }

    pub fn kind(&self) -> OpenErrorKind {
        match self {
            OpenError::NotConnected { .. } => OpenErrorKind::NotConnected,
            OpenError::NotFound { .. } => OpenErrorKind::NotFound,
            OpenError::ConversionFailed { .. } => OpenErrorKind::ConversionFailed,
            OpenError::CacheWriteFailed { .. } => OpenErrorKind::CacheWriteFailed,
            OpenError::OpenFailed { .. } => OpenErrorKind::OpenFailed,
        }
    }

    /// Short message for end users. Causes stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            OpenError::NotConnected { .. } => {
                "Could not connect to WikiPathways. Check the service URL setting.".to_string()
            }
            OpenError::NotFound { id, .. } => {
                format!("Pathway {id} was not found on WikiPathways.")
            }
            OpenError::ConversionFailed { id, .. } => format!("Pathway {id} could not be read."),
            OpenError::CacheWriteFailed { .. } => {
                "The pathway could not be saved to the local cache.".to_string()
            }
            OpenError::OpenFailed { .. } => "The editor could not open the pathway.".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum OpenOutcome {
    Opened {
        /// Resolved identifier (the service's answer, not the request).
        document: DocumentIdentifier,
        path: PathBuf,
        /// Region of the first highlighted element, when reference keys matched.
        highlighted: Option<Region>,
    },
    /// Cancellation was observed at the boundary after `after` (`None`: before fetching).
    Cancelled { after: Option<Step> },
    Failed(OpenError),
}

/// Everything one invocation produced, handed to the foreground on completion.
#[derive(Debug)]
pub struct OpenReport {
    pub request: DocumentIdentifier,
    /// Steps that ran to completion, in order.
    pub completed: Vec<Step>,
    /// Session update staged by the update-state step; the foreground commits it.
    pub session_update: Option<DocumentIdentifier>,
    /// Species of the opened pathway, once converted.
    pub species: Option<String>,
    pub outcome: OpenOutcome,
}

impl OpenReport {
    pub(crate) fn new(request: DocumentIdentifier) -> Self {
        Self {
            request,
            completed: Vec::new(),
            session_update: None,
            species: None,
            outcome: OpenOutcome::Cancelled { after: None },
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self.outcome, OpenOutcome::Opened { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, OpenOutcome::Cancelled { .. })
    }

    pub fn error(&self) -> Option<&OpenError> {
        match &self.outcome {
            OpenOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<OpenErrorKind> {
        self.error().map(OpenError::kind)
    }
}
