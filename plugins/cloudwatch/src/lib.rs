//! Publication of metric records to Amazon CloudWatch.
mod client;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use client::{classify_error, to_metric_datum, CloudWatchBackend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Deadline of a `PutMetricData` operation, retries included.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Overrides the CloudWatch endpoint, e.g. to target a local emulator.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endpoint_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            endpoint_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_config() {
        let parsed: Config = toml::from_str(r#"timeout = "3s""#).expect("config should be valid");
        assert_eq!(parsed.timeout, Duration::from_secs(3));
        assert_eq!(parsed.endpoint_url, None);

        let config = r#"
            timeout = "1m"
            endpoint_url = "http://localhost:4566"
        "#;
        let parsed: Config = toml::from_str(config).expect("config should be valid");
        assert_eq!(parsed.timeout, Duration::from_secs(60));
        assert_eq!(parsed.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }
}
