//! Collaborators that provide the identity of the host.
use std::path::PathBuf;

use thiserror::Error;

use crate::dimension::AttributeMap;

/// Provides the attributes of the host (instance id, image id, instance type, ...).
pub trait IdentitySource {
    /// Fetches the identity of the instance.
    ///
    /// Missing attributes are not an error: they are simply absent from the map.
    fn fetch_instance_identity(&self) -> Result<AttributeMap, FetchError>;
}

/// Provides the identifier of the cluster that the host belongs to.
pub trait ClusterSource {
    fn read_cluster_id(&self) -> Result<String, ReadError>;
}

/// Error returned by [`IdentitySource::fetch_instance_identity`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("can't reach metadata endpoint {url}")]
    Unreachable {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("metadata endpoint {url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("can't decode metadata document")]
    Decode(#[source] anyhow::Error),
}

/// Error returned by [`ClusterSource::read_cluster_id`].
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("could not read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("key {key} not found")]
    MissingKey { key: String },
    #[error("key {key} has an empty value")]
    EmptyValue { key: String },
}

#[cfg(test)]
pub(crate) use fakes::{FakeClusterSource, FakeIdentitySource};

#[cfg(test)]
mod fakes {
    use std::cell::Cell;

    use super::*;

    /// Cluster source that returns a fixed result and counts how many times it has been called.
    pub struct FakeClusterSource {
        result: Result<String, Box<dyn Fn() -> ReadError>>,
        pub calls: Cell<usize>,
    }

    impl FakeClusterSource {
        pub fn ok(cluster: &str) -> Self {
            Self {
                result: Ok(cluster.to_owned()),
                calls: Cell::new(0),
            }
        }

        /// Fails with the error built by `make` (`ReadError` is not `Clone`).
        pub fn err(make: impl Fn() -> ReadError + 'static) -> Self {
            Self {
                result: Err(Box::new(make)),
                calls: Cell::new(0),
            }
        }
    }

    impl ClusterSource for FakeClusterSource {
        fn read_cluster_id(&self) -> Result<String, ReadError> {
            self.calls.set(self.calls.get() + 1);
            match &self.result {
                Ok(cluster) => Ok(cluster.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    impl<T: ClusterSource> ClusterSource for std::rc::Rc<T> {
        fn read_cluster_id(&self) -> Result<String, ReadError> {
            self.as_ref().read_cluster_id()
        }
    }

    pub struct FakeIdentitySource(pub Option<AttributeMap>);

    impl IdentitySource for FakeIdentitySource {
        fn fetch_instance_identity(&self) -> Result<AttributeMap, FetchError> {
            match &self.0 {
                Some(attrs) => Ok(attrs.clone()),
                None => Err(FetchError::Unreachable {
                    url: String::from("http://169.254.169.254/latest/dynamic/instance-identity/document"),
                    source: anyhow::anyhow!("connection refused"),
                }),
            }
        }
    }
}
