//! Agent configuration options.
//!
//! We use `serde` to parse these options from the TOML config file,
//! and to write the default configuration to the TOML config file.
use std::path::Path;

use anyhow::Context;
use hostmetrics::AttributeMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "ECS/Hosts";

/// Attribute of the identity document that holds the region of the instance.
const REGION_ATTRIBUTE: &str = "region";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Namespace of the published metrics.
    pub namespace: String,
    /// Region of the metrics backend. Defaults to the region of the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub identity: plugin_ec2_identity::Config,
    #[serde(default)]
    pub cluster: plugin_ecs_cluster::Config,
    #[serde(default)]
    pub cloudwatch: plugin_cloudwatch::Config,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            namespace: String::from(DEFAULT_NAMESPACE),
            region: None,
            identity: Default::default(),
            cluster: Default::default(),
            cloudwatch: Default::default(),
        }
    }
}

impl AgentConfig {
    /// Returns the default config, serialized to TOML.
    pub fn default_string() -> anyhow::Result<String> {
        toml::to_string(&AgentConfig::default()).context("failed to serialize the default config")
    }

    /// Loads the config from a file.
    ///
    /// If the file does not exist and `write_default` is true, the default config
    /// is written to `path` and returned.
    pub fn load(path: &Path, write_default: bool) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).with_context(|| format!("invalid config file {path:?}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && write_default => {
                log::warn!("Config file {path:?} not found, writing the default configuration to it.");
                std::fs::write(path, Self::default_string()?)
                    .with_context(|| format!("could not write the default config to {path:?}"))?;
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("could not read config file {path:?}")),
        }
    }

    /// Chooses the region to publish to: the configured one, or else the region of the instance.
    pub fn resolve_region(&self, host_attributes: &AttributeMap) -> anyhow::Result<String> {
        match (&self.region, host_attributes.get(REGION_ATTRIBUTE)) {
            (Some(region), _) => Ok(region.clone()),
            (None, Some(region)) => {
                log::debug!("using the region of the instance: {region}");
                Ok(region.clone())
            }
            (None, None) => Err(anyhow::anyhow!(
                "no region configured, and the instance identity does not tell the region of the host"
            )),
        }
    }
}
