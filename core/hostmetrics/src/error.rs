//! Errors surfaced to the callers of the pipeline.
use thiserror::Error;

use crate::{
    measurement::InvalidMeasurement,
    publish::PublishError,
    source::{FetchError, ReadError},
};

/// Error returned by the operations of the [`pipeline`](crate::pipeline).
///
/// Every kind of failure is kept distinct, so that the caller can tell whether
/// its input or configuration is wrong ([`Error::is_local`]) or whether the
/// network or the remote service is unavailable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The instance metadata could not be fetched or decoded.
    #[error("instance identity unavailable")]
    IdentityUnavailable(#[source] FetchError),
    /// The cluster membership of the host is unknown.
    ///
    /// Nothing is published in that case, to avoid sending mis-scoped metrics.
    #[error("cluster identity unavailable")]
    ClusterIdentityUnavailable(#[source] ReadError),
    /// The backend rejected the request with a structured code and message.
    #[error("[{code}] {message}")]
    Service { code: String, message: String },
    /// The request failed below the application layer of the backend.
    /// The whole cause chain is part of the message.
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
    /// The measurement supplied by the caller breaks the record invariants.
    #[error(transparent)]
    InvalidMeasurement(#[from] InvalidMeasurement),
    /// The publish request is invalid before any I/O (e.g. empty namespace).
    #[error("invalid publish request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns `true` if the error comes from the input or the local configuration,
    /// `false` if it comes from the network or from a remote service.
    pub fn is_local(&self) -> bool {
        match self {
            Error::ClusterIdentityUnavailable(_) | Error::InvalidMeasurement(_) | Error::InvalidRequest(_) => true,
            Error::IdentityUnavailable(_) | Error::Service { .. } | Error::Transport(_) => false,
        }
    }
}

impl From<PublishError> for Error {
    fn from(value: PublishError) -> Self {
        match value {
            PublishError::Service { code, message } => Error::Service { code, message },
            PublishError::Transport(e) => Error::Transport(e),
            PublishError::InvalidRequest(msg) => Error::InvalidRequest(msg),
        }
    }
}
