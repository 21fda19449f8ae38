//! Cluster membership of an ECS container instance, read from the configuration of the ECS agent.
//!
//! The ECS agent is configured by a file of `KEY=VALUE` lines, for instance:
//! ```text
//! ECS_CLUSTER=my-cluster
//! ECS_ENABLE_TASK_IAM_ROLE=true
//! ```
use std::path::PathBuf;

use hostmetrics::source::{ClusterSource, ReadError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "/etc/ecs/ecs.config";
pub const DEFAULT_KEY: &str = "ECS_CLUSTER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the configuration file of the ECS agent.
    pub config_file: PathBuf,
    /// Key of the line that holds the cluster name.
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            key: String::from(DEFAULT_KEY),
        }
    }
}

/// Reads the cluster identifier from the ECS agent configuration file.
///
/// The file is read on every call, nothing is cached.
pub struct EcsConfigFile {
    path: PathBuf,
    key: String,
}

impl EcsConfigFile {
    pub fn new(config: Config) -> Self {
        Self {
            path: config.config_file,
            key: config.key,
        }
    }
}

impl ClusterSource for EcsConfigFile {
    fn read_cluster_id(&self) -> Result<String, ReadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ReadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let cluster = parse_value(&content, &self.key)?;
        log::debug!("found {}={cluster} in {:?}", self.key, self.path);
        Ok(cluster)
    }
}

/// Finds the value of `key` in a list of `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are ignored. The first line with the key wins.
/// The value is trimmed, and must not be empty.
pub fn parse_value(content: &str, key: &str) -> Result<String, ReadError> {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            if k.trim() == key {
                let value = v.trim();
                if value.is_empty() {
                    return Err(ReadError::EmptyValue { key: key.to_owned() });
                }
                return Ok(value.to_owned());
            }
        }
    }
    Err(ReadError::MissingKey { key: key.to_owned() })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_lines() {
        let content = "ECS_ENABLE_TASK_IAM_ROLE=true\nECS_CLUSTER=prod-cluster \nECS_CLUSTER=other\n";
        assert_eq!(parse_value(content, "ECS_CLUSTER").unwrap(), "prod-cluster");
        assert_eq!(parse_value(content, "ECS_ENABLE_TASK_IAM_ROLE").unwrap(), "true");
    }

    #[test]
    fn parse_comments_and_spaces() {
        let content = "# ECS_CLUSTER=commented\n\n  ECS_CLUSTER = spaced-cluster\n";
        assert_eq!(parse_value(content, "ECS_CLUSTER").unwrap(), "spaced-cluster");
    }

    #[test]
    fn parse_no_prefix_match() {
        let content = "ECS_CLUSTER_NAME=nope\n";
        assert!(matches!(
            parse_value(content, "ECS_CLUSTER"),
            Err(ReadError::MissingKey { key }) if key == "ECS_CLUSTER"
        ));
    }

    #[test]
    fn parse_empty_value() {
        assert!(matches!(
            parse_value("ECS_CLUSTER=\n", "ECS_CLUSTER"),
            Err(ReadError::EmptyValue { .. })
        ));
    }

    #[test]
    fn value_with_separator() {
        assert_eq!(parse_value("ECS_CLUSTER=a=b", "ECS_CLUSTER").unwrap(), "a=b");
    }

    #[test]
    fn read_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ecs.config");
        std::fs::write(&path, "ECS_CLUSTER=prod-cluster\nECS_LOGLEVEL=info\n").unwrap();

        let source = EcsConfigFile::new(Config {
            config_file: path,
            key: String::from(DEFAULT_KEY),
        });
        assert_eq!(source.read_cluster_id().unwrap(), "prod-cluster");
    }

    #[test]
    fn missing_file() {
        let tmp = tempdir().unwrap();
        let source = EcsConfigFile::new(Config {
            config_file: tmp.path().join("does-not-exist"),
            key: String::from(DEFAULT_KEY),
        });
        let err = source.read_cluster_id().unwrap_err();
        assert!(matches!(err, ReadError::Io { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn file_without_key() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ecs.config");
        std::fs::write(&path, "ECS_LOGLEVEL=info\n").unwrap();
        let source = EcsConfigFile::new(Config {
            config_file: path,
            key: String::from(DEFAULT_KEY),
        });
        assert!(matches!(source.read_cluster_id(), Err(ReadError::MissingKey { .. })));
    }

    #[test]
    fn parse_config() {
        let parsed: Config = toml::from_str(
            r#"
            config_file = "/opt/ecs/ecs.config"
            key = "CLUSTER"
        "#,
        )
        .unwrap();
        assert_eq!(parsed.config_file, PathBuf::from("/opt/ecs/ecs.config"));
        assert_eq!(parsed.key, "CLUSTER");
    }
}
