//! HOSTMETRICS: host-tagged metrics for container clusters.
//!
//! This crate turns raw application measurements (a name, a unit and a value) into
//! fully-dimensioned metric records and hands them to a remote metrics backend.
//!
//! # Pipeline
//! A collection cycle has four steps:
//! 1. Obtain the attributes of the host from an [`IdentitySource`](source::IdentitySource)
//!    and its cluster identifier from a [`ClusterSource`](source::ClusterSource).
//! 2. Shape these attributes into [dimension sets](dimension::DimensionSet).
//! 3. [Compose](compose) every measurement into two records: one scoped to the host,
//!    one scoped to the cluster.
//! 4. [Publish](publish::Publisher) the whole batch in one call to a
//!    [`MetricsBackend`](publish::MetricsBackend).
//!
//! The core does not talk to the network or read files by itself.
//! The collaborators are traits, implemented by the plugin crates of the workspace
//! (EC2 instance identity, ECS agent configuration, CloudWatch).
//! See [`pipeline::Emitter`] for the end-to-end entry point.

pub mod compose;
pub mod dimension;
pub mod error;
pub mod measurement;
pub mod pipeline;
pub mod publish;
pub mod source;

pub use dimension::{AttributeMap, Dimension, DimensionSet};
pub use error::Error;
pub use measurement::{Measurement, MetricBatch, MetricRecord};

/// Version of the core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
