//! End-to-end collection cycle: collect identity, build dimensions, compose, publish.
//!
//! # Example
//! ```no_run
//! use hostmetrics::{pipeline::Emitter, publish::MetricsBackend, source::ClusterSource, AttributeMap};
//!
//! fn run(cluster: Box<dyn ClusterSource>, backend: impl MetricsBackend, host: &AttributeMap) -> Result<(), hostmetrics::Error> {
//!     let emitter = Emitter::new(cluster, backend);
//!     emitter.emit_metric("DiskFree", "Percent", 87.5, host, "ECS/Hosts", "us-west-1")
//! }
//! ```
use crate::{
    compose,
    dimension::{self, AttributeMap, DimensionSet},
    error::Error,
    measurement::{Measurement, MetricBatch},
    publish::{MetricsBackend, Publisher},
    source::{ClusterSource, IdentitySource},
};

/// Fetches the identity of the host and merges it with `extra` attributes.
///
/// On conflict, the attributes given by the caller win.
pub fn collect_host_attributes(source: &dyn IdentitySource, extra: AttributeMap) -> Result<AttributeMap, Error> {
    let mut attrs = source.fetch_instance_identity().map_err(Error::IdentityUnavailable)?;
    log::debug!("instance identity: {attrs:?}");
    attrs.extend(extra);
    Ok(attrs)
}

/// Emits host-tagged metrics to a backend.
pub struct Emitter<B: MetricsBackend> {
    cluster: Box<dyn ClusterSource>,
    publisher: Publisher<B>,
}

/// A collection cycle: the dimensions are resolved once, then the measurements
/// are accumulated and finally published together.
pub struct Cycle<'a, B: MetricsBackend> {
    publisher: &'a Publisher<B>,
    host: DimensionSet,
    cluster: DimensionSet,
    batch: MetricBatch,
}

impl<B: MetricsBackend> Emitter<B> {
    pub fn new(cluster: Box<dyn ClusterSource>, backend: B) -> Self {
        Self {
            cluster,
            publisher: Publisher::new(backend),
        }
    }

    pub fn publisher(&self) -> &Publisher<B> {
        &self.publisher
    }

    /// Starts a new collection cycle for a host with the given attributes.
    ///
    /// The cluster identity is read here, and only here.
    ///
    /// # Errors
    /// Fails with [`Error::ClusterIdentityUnavailable`] if the cluster of the host is unknown.
    pub fn begin_cycle(&self, host_attributes: &AttributeMap) -> Result<Cycle<'_, B>, Error> {
        let cluster = dimension::build_cluster_dimension(self.cluster.as_ref())?;
        let host = dimension::build_host_dimensions(host_attributes);
        Ok(Cycle {
            publisher: &self.publisher,
            host,
            cluster,
            batch: MetricBatch::new(),
        })
    }

    /// Tags one measurement and publishes it, in a cycle of its own.
    pub fn emit_metric(
        &self,
        name: &str,
        unit: &str,
        value: f64,
        host_attributes: &AttributeMap,
        namespace: &str,
        region: &str,
    ) -> Result<(), Error> {
        let measurement = Measurement::new(name, unit, value)?;
        let mut cycle = self.begin_cycle(host_attributes)?;
        cycle.add(&measurement);
        cycle.publish(namespace, region)
    }
}

impl<B: MetricsBackend> Cycle<'_, B> {
    /// Composes a measurement into the batch of this cycle (two records).
    pub fn add(&mut self, measurement: &Measurement) {
        compose::compose(measurement, &self.host, &self.cluster, &mut self.batch);
    }

    pub fn host_dimensions(&self) -> &DimensionSet {
        &self.host
    }

    pub fn cluster_dimensions(&self) -> &DimensionSet {
        &self.cluster
    }

    pub fn batch(&self) -> &MetricBatch {
        &self.batch
    }

    /// Ends the cycle without publishing anything, and returns the batch.
    pub fn into_batch(self) -> MetricBatch {
        self.batch
    }

    /// Ends the cycle by publishing the batch.
    pub fn publish(self, namespace: &str, region: &str) -> Result<(), Error> {
        self.publisher.publish(&self.batch, namespace, region)?;
        Ok(())
    }
}
