//! Publication of metric batches to a remote backend.
use thiserror::Error;

use crate::measurement::{MetricBatch, MetricRecord};

/// A remote metrics ingestion service.
///
/// The implementations are expected to open a new session (scoped to `region`)
/// on every call. They must not chunk nor retry the submission: the backend
/// does its own size and rate limiting.
pub trait MetricsBackend {
    /// Submits all the `records` under `namespace`, in a single request.
    fn put_metric_data(&self, region: &str, namespace: &str, records: &[MetricRecord]) -> Result<Ack, BackendError>;
}

/// Acknowledgment of a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Identifier of the request, as returned by the backend (if any).
    pub request_id: Option<String>,
}

/// Error returned by a [`MetricsBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the request and returned a code and a message
    /// (throttling, validation, authorization...).
    #[error("[{code}] {message}")]
    Service { code: String, message: String },
    /// Any other failure: unreachable network, timeout, malformed response...
    #[error(transparent)]
    Transport(anyhow::Error),
}

/// Error returned by [`Publisher::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The backend rejected the request. The code and message are kept as-is.
    #[error("[{code}] {message}")]
    Service { code: String, message: String },
    #[error("failed to reach the metrics backend: {0:#}")]
    Transport(anyhow::Error),
    #[error("invalid publish request: {0}")]
    InvalidRequest(String),
}

impl From<BackendError> for PublishError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Service { code, message } => PublishError::Service { code, message },
            BackendError::Transport(e) => PublishError::Transport(e),
        }
    }
}

/// Sends metric batches to a [`MetricsBackend`].
pub struct Publisher<B: MetricsBackend> {
    backend: B,
}

impl<B: MetricsBackend> Publisher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Publishes the whole `batch` under `namespace`, in `region`.
    ///
    /// The batch is not modified, whatever the outcome.
    /// An empty batch is not sent.
    pub fn publish(&self, batch: &MetricBatch, namespace: &str, region: &str) -> Result<(), PublishError> {
        if namespace.is_empty() {
            return Err(PublishError::InvalidRequest(String::from("the namespace is empty")));
        }
        if region.is_empty() {
            return Err(PublishError::InvalidRequest(String::from("the region is empty")));
        }
        if batch.is_empty() {
            log::debug!("nothing to publish to {namespace} ({region})");
            return Ok(());
        }

        log::debug!("publishing {} records to {namespace} ({region})", batch.len());
        let ack = self.backend.put_metric_data(region, namespace, batch.records())?;
        match ack.request_id {
            Some(id) => log::info!("published {} records to {namespace}, request id {id}", batch.len()),
            None => log::info!("published {} records to {namespace}", batch.len()),
        }
        Ok(())
    }
}
