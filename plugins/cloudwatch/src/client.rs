use std::time::Duration;

use anyhow::Context;
use aws_config::{timeout::TimeoutConfig, AppName, BehaviorVersion, Region};
use aws_sdk_cloudwatch::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{put_metric_data::PutMetricDataError, RequestId},
    types::{Dimension, MetricDatum, StandardUnit},
    Client,
};
use hostmetrics::{
    publish::{Ack, BackendError, MetricsBackend},
    MetricRecord,
};

use crate::Config;

/// CloudWatch backend.
///
/// A new client (and a new runtime to drive it) is created on every call, in the region given by the caller.
/// Credentials are resolved by the default AWS provider chain.
pub struct CloudWatchBackend {
    timeout: Duration,
    endpoint_url: Option<String>,
}

/// Name of the application, sent in the user agent.
fn app_name() -> Option<AppName> {
    let name = format!("hostmetrics-{}", env!("CARGO_PKG_VERSION").replace('.', "_"));
    match AppName::new(name) {
        Ok(app) => Some(app),
        Err(e) => {
            log::warn!("invalid app name for the user agent: {e}");
            None
        }
    }
}

impl CloudWatchBackend {
    pub fn new(config: Config) -> Self {
        Self {
            timeout: config.timeout,
            endpoint_url: config.endpoint_url,
        }
    }

    async fn client(&self, region: &str) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .timeout_config(TimeoutConfig::builder().operation_timeout(self.timeout).build());
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        if let Some(app) = app_name() {
            loader = loader.app_name(app);
        }
        #[cfg(test)]
        {
            loader = loader.test_credentials();
        }
        let sdk_config = loader.load().await;
        Client::new(&sdk_config)
    }
}

impl MetricsBackend for CloudWatchBackend {
    fn put_metric_data(&self, region: &str, namespace: &str, records: &[MetricRecord]) -> Result<Ack, BackendError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start the async runtime")
            .map_err(BackendError::Transport)?;

        let data: Vec<MetricDatum> = records.iter().map(to_metric_datum).collect();
        log::trace!("PutMetricData {namespace} in {region}: {data:?}");

        let output = runtime
            .block_on(async {
                self.client(region)
                    .await
                    .put_metric_data()
                    .namespace(namespace)
                    .set_metric_data(Some(data))
                    .send()
                    .await
            })
            .map_err(classify_error)?;

        Ok(Ack {
            request_id: output.request_id().map(str::to_owned),
        })
    }
}

/// Converts a record to the CloudWatch model.
///
/// Units unknown to CloudWatch are passed as-is (the service will reject them).
pub fn to_metric_datum(record: &MetricRecord) -> MetricDatum {
    let m = &record.measurement;
    if !StandardUnit::values().iter().any(|u| *u == m.unit()) {
        log::warn!("unit '{}' of metric '{}' is not a CloudWatch standard unit", m.unit(), m.name());
    }
    let dimensions: Vec<Dimension> = record
        .dimensions
        .iter()
        .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
        .collect();
    let mut datum = MetricDatum::builder()
        .metric_name(m.name())
        .unit(StandardUnit::from(m.unit()))
        .value(m.value());
    if !dimensions.is_empty() {
        datum = datum.set_dimensions(Some(dimensions));
    }
    datum.build()
}

/// Sorts an SDK error into a service error (code and message returned by CloudWatch)
/// or a transport error (everything else).
///
/// An error response without a code could not be decoded, e.g. an HTML page sent by a proxy:
/// it is a transport error, tagged with the HTTP status.
pub fn classify_error(err: SdkError<PutMetricDataError, HttpResponse>) -> BackendError {
    match err {
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            let e = ctx.into_err();
            match e.code() {
                Some(code) => BackendError::Service {
                    code: code.to_owned(),
                    message: e.message().unwrap_or_default().to_owned(),
                },
                None => BackendError::Transport(anyhow::anyhow!(
                    "unexpected response with status {status}: {}",
                    DisplayErrorContext(&e)
                )),
            }
        }
        other => BackendError::Transport(anyhow::anyhow!("{}", DisplayErrorContext(&other))),
    }
}
