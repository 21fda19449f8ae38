use anyhow::Context;
use hostmetrics::{
    source::{FetchError, IdentitySource},
    AttributeMap,
};
use serde_json::Value;

use crate::Config;

/// Client of the instance identity document (limited capabilities, just what we need).
///
/// A document looks like this (abridged):
/// ```json
/// {
///   "privateIp" : "10.0.5.89",
///   "availabilityZone" : "us-west-1a",
///   "region" : "us-west-1",
///   "instanceId" : "i-e0iag2b",
///   "billingProducts" : null,
///   "accountId" : "208372078340",
///   "instanceType" : "m3.xlarge",
///   "imageId" : "ami-43f91b07",
///   "architecture" : "x86_64"
/// }
/// ```
pub struct InstanceIdentityClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl InstanceIdentityClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            url: config.url,
        })
    }
}

impl IdentitySource for InstanceIdentityClient {
    fn fetch_instance_identity(&self) -> Result<AttributeMap, FetchError> {
        log::debug!("GET {}", self.url);
        let unreachable = |e: reqwest::Error| FetchError::Unreachable {
            url: self.url.clone(),
            source: e.into(),
        };

        let response = self.client.get(&self.url).send().map_err(unreachable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(unreachable)?;
        log::trace!("identity document: {}", String::from_utf8_lossy(&body));
        decode_document(&body)
    }
}

/// Decodes an identity document into attributes.
///
/// Every field of the document must be a string, a number, a boolean or `null`.
/// Fields set to `null` are left out. Nested arrays and objects are left out as well.
pub fn decode_document(body: &[u8]) -> Result<AttributeMap, FetchError> {
    let fields: serde_json::Map<String, Value> = serde_json::from_slice(body)
        .context("the identity document is not a JSON object")
        .map_err(FetchError::Decode)?;

    let attrs = fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            Value::Null => None,
            Value::Array(_) | Value::Object(_) => {
                log::trace!("skipping non-scalar field {key} of identity document");
                None
            }
        })
        .collect();
    Ok(attrs)
}
