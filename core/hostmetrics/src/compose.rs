//! Composition of measurements into metric records.
//!
//! Every measurement is emitted twice: once with the host dimensions, once with the
//! cluster dimension. The backend can then answer per-host and per-cluster queries
//! for the same signal, without any rollup.
use crate::{
    dimension::{self, DimensionSet},
    error::Error,
    measurement::{Measurement, MetricBatch, MetricRecord},
    source::ClusterSource,
};

/// Appends the host-scoped record, then the cluster-scoped record, to `batch`.
///
/// Exactly two records are appended, even if a dimension set is empty.
pub fn compose(measurement: &Measurement, host: &DimensionSet, cluster: &DimensionSet, batch: &mut MetricBatch) {
    for dimensions in [host, cluster] {
        let record = MetricRecord::new(measurement.clone(), dimensions.clone());
        log::debug!("composed record {record}");
        batch.push(record);
    }
}

/// Like [`compose`], but obtains the cluster dimension from `source` first.
///
/// # Errors
/// If the cluster identity is unavailable, returns [`Error::ClusterIdentityUnavailable`]
/// and leaves `batch` untouched.
pub fn compose_with_source(
    measurement: &Measurement,
    host: &DimensionSet,
    source: &dyn ClusterSource,
    batch: &mut MetricBatch,
) -> Result<(), Error> {
    let cluster = dimension::build_cluster_dimension(source)?;
    compose(measurement, host, &cluster, batch);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        dimension::{cluster_dimensions, Dimension},
        source::{FakeClusterSource, ReadError},
    };

    fn disk_free() -> Measurement {
        Measurement::new("DiskFree", "Percent", 87.5).unwrap()
    }

    #[test]
    fn two_records_per_call() {
        let host = DimensionSet::from_iter([
            Dimension::new("InstanceId", "i-1"),
            Dimension::new("ImageId", "ami-2"),
        ]);
        let cluster = cluster_dimensions("c1");
        let mut batch = MetricBatch::new();

        compose(&disk_free(), &host, &cluster, &mut batch);
        assert_eq!(batch.len(), 2);
        compose(&disk_free(), &host, &cluster, &mut batch);
        assert_eq!(batch.len(), 4);

        let records = batch.records();
        assert_eq!(records[0].measurement, records[1].measurement);
        assert_eq!(records[0].dimensions, host);
        assert_eq!(records[1].dimensions, cluster);
    }

    #[test]
    fn empty_host_dimensions() {
        let mut batch = MetricBatch::new();
        compose(&disk_free(), &DimensionSet::new(), &cluster_dimensions("c1"), &mut batch);
        assert_eq!(batch.len(), 2);
        assert!(batch.records()[0].dimensions.is_empty());
        assert_eq!(batch.records()[1].dimensions.len(), 1);
    }

    #[test]
    fn existing_records_are_kept() {
        let mut batch = MetricBatch::new();
        let other = Measurement::new("MemoryUsed", "Megabytes", 512.0).unwrap();
        batch.push(MetricRecord::new(other.clone(), DimensionSet::new()));

        compose(&disk_free(), &DimensionSet::new(), &cluster_dimensions("c1"), &mut batch);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.records()[0].measurement, other);
    }

    #[test]
    fn source_is_asked_on_every_call() {
        let source = FakeClusterSource::ok("c1");
        let mut batch = MetricBatch::new();
        compose_with_source(&disk_free(), &DimensionSet::new(), &source, &mut batch).unwrap();
        compose_with_source(&disk_free(), &DimensionSet::new(), &source, &mut batch).unwrap();
        assert_eq!(source.calls.get(), 2);
        assert_eq!(batch.records()[3].dimensions.get("Cluster"), Some("c1"));
    }

    #[test]
    fn cluster_failure_appends_nothing() {
        let source = FakeClusterSource::err(|| ReadError::MissingKey {
            key: String::from("ECS_CLUSTER"),
        });
        let host = DimensionSet::from_iter([Dimension::new("InstanceId", "i-1")]);
        let mut batch = MetricBatch::new();

        let res = compose_with_source(&disk_free(), &host, &source, &mut batch);
        assert!(matches!(res, Err(Error::ClusterIdentityUnavailable(_))));
        assert!(batch.is_empty());
    }
}
