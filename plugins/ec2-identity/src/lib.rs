//! Identity of an EC2 instance, read from the instance metadata service.
mod document;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use document::{decode_document, InstanceIdentityClient};

/// Address of the instance identity document, on every EC2 instance.
pub const DEFAULT_DOCUMENT_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where to GET the identity document.
    pub url: String,
    /// Deadline of the whole request.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_DOCUMENT_URL),
            timeout: Duration::from_secs(2),
        }
    }
}
