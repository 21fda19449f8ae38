//! Dimensions: the named tags that scope a metric record.
use std::{collections::BTreeMap, fmt};

use crate::{error::Error, source::ClusterSource};

/// Attributes of the host, as obtained from the identity source or supplied by the caller.
pub type AttributeMap = BTreeMap<String, String>;

/// Name of the dimension that holds the cluster identifier.
pub const CLUSTER_DIMENSION: &str = "Cluster";

/// Host attributes that become dimensions, and the name of the dimension they map to.
///
/// The order of this table is the order of the dimensions in the host-scoped records.
/// Recognizing a new attribute only requires a new line here.
pub const HOST_DIMENSIONS: &[(&str, &str)] = &[
    ("instanceId", "InstanceId"),
    ("imageId", "ImageId"),
    ("instanceType", "InstanceType"),
    ("fileSystem", "FileSystem"),
];

/// A `(name, value)` pair that identifies a scope axis of a metric, e.g. `InstanceId=i-1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// An ordered sequence of dimensions.
///
/// The backend may display the dimensions in submission order, nothing else depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSet(Vec<Dimension>);

impl DimensionSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, dimension: Dimension) {
        self.0.push(dimension);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dimension> {
        self.0.iter()
    }

    /// Returns the value of the first dimension with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|d| d.name == name).map(|d| d.value.as_str())
    }
}

impl FromIterator<Dimension> for DimensionSet {
    fn from_iter<T: IntoIterator<Item = Dimension>>(iter: T) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl<'a> IntoIterator for &'a DimensionSet {
    type Item = &'a Dimension;
    type IntoIter = std::slice::Iter<'a, Dimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DimensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Builds the host-scoped dimensions from the attributes of the host.
///
/// Only the attributes listed in [`HOST_DIMENSIONS`] are used, in that order.
/// Missing attributes are skipped.
pub fn build_host_dimensions(attrs: &AttributeMap) -> DimensionSet {
    HOST_DIMENSIONS
        .iter()
        .filter_map(|(key, name)| attrs.get(*key).map(|value| Dimension::new(*name, value)))
        .collect()
}

/// Wraps a cluster identifier into the cluster-scoped dimensions.
pub fn cluster_dimensions(cluster_id: impl Into<String>) -> DimensionSet {
    DimensionSet(vec![Dimension::new(CLUSTER_DIMENSION, cluster_id)])
}

/// Asks the cluster source for the cluster identifier and builds the cluster-scoped dimensions.
///
/// # Errors
/// If the source cannot provide an identifier, returns [`Error::ClusterIdentityUnavailable`].
pub fn build_cluster_dimension(source: &dyn ClusterSource) -> Result<DimensionSet, Error> {
    let cluster_id = source.read_cluster_id().map_err(Error::ClusterIdentityUnavailable)?;
    log::debug!("host is a member of cluster {cluster_id:?}");
    Ok(cluster_dimensions(cluster_id))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use std::path::PathBuf;

    use crate::source::{FakeClusterSource, ReadError};

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn no_recognized_attribute() {
        let a = attrs(&[("availabilityZone", "us-west-1a"), ("region", "us-west-1")]);
        assert!(build_host_dimensions(&a).is_empty());
        assert!(build_host_dimensions(&AttributeMap::new()).is_empty());
    }

    #[test]
    fn instance_id_only() {
        let dims = build_host_dimensions(&attrs(&[("instanceId", "i-1234")]));
        assert_eq!(dims.len(), 1);
        assert_eq!(dims, DimensionSet::from_iter([Dimension::new("InstanceId", "i-1234")]));
    }

    #[test]
    fn table_order() {
        // the map is sorted by key, the dimensions follow the table
        let a = attrs(&[
            ("fileSystem", "/dev/xvda1"),
            ("instanceType", "m3.xlarge"),
            ("imageId", "ami-43f91b07"),
            ("instanceId", "i-e0iag2b"),
            ("privateIp", "10.0.5.89"),
        ]);
        let dims = build_host_dimensions(&a);
        let names: Vec<&str> = dims.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["InstanceId", "ImageId", "InstanceType", "FileSystem"]);
        assert_eq!(dims.get("FileSystem"), Some("/dev/xvda1"));
        assert_eq!(
            dims.to_string(),
            "InstanceId=i-e0iag2b, ImageId=ami-43f91b07, InstanceType=m3.xlarge, FileSystem=/dev/xvda1"
        );
    }

    #[test]
    fn idempotent() {
        let a = attrs(&[("instanceId", "i-1"), ("imageId", "ami-2")]);
        assert_eq!(build_host_dimensions(&a), build_host_dimensions(&a));
    }

    #[test]
    fn cluster_from_source() {
        let source = FakeClusterSource::ok("prod-cluster");
        let dims = build_cluster_dimension(&source).unwrap();
        assert_eq!(dims, cluster_dimensions("prod-cluster"));
        assert_eq!(dims.get(CLUSTER_DIMENSION), Some("prod-cluster"));
    }

    #[test]
    fn cluster_missing_key() {
        let source = FakeClusterSource::err(|| ReadError::MissingKey {
            key: String::from("CLUSTER_NAME"),
        });
        let err = build_cluster_dimension(&source).unwrap_err();
        assert!(matches!(
            err,
            Error::ClusterIdentityUnavailable(ReadError::MissingKey { ref key }) if key == "CLUSTER_NAME"
        ));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn cluster_unreadable_file() {
        let source = FakeClusterSource::err(|| ReadError::Io {
            path: PathBuf::from("/tmp/ecs.config"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        let err = build_cluster_dimension(&source).unwrap_err();
        match err {
            Error::ClusterIdentityUnavailable(ReadError::Io { path, source }) => {
                assert_eq!(path, PathBuf::from("/tmp/ecs.config"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
