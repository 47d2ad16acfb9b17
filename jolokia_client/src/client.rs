use crate::error::MetricsFetchError;
use crate::mbean::{mbean_short_name, BROKER_MBEANS};
use crate::payload::{MeterMetric, ProxyConfig, ProxyTarget, ReadRequest, ReadResponse};
use anyhow::Context;
use getset::Getters;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const OK_STATUS: u32 = 200;

/// Reads broker meters from Jolokia agents, directly or through a JMX proxy.
pub struct JolokiaClient {
    hosts: Vec<String>,
    proxy: Option<ProxyConfig>,
    http: reqwest::Client,
}

/// Meters of one host keyed by short bean name.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct HostMetrics {
    #[getset(get = "pub")]
    host: String,
    #[getset(get = "pub")]
    meters: BTreeMap<String, MeterMetric>,
}

impl HostMetrics {
    pub fn new(host: &str, meters: BTreeMap<String, MeterMetric>) -> Self {
        Self {
            host: host.to_owned(),
            meters,
        }
    }
}

impl JolokiaClient {
    pub fn new(
        hosts: Vec<String>,
        proxy: Option<ProxyConfig>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("While building jolokia http client")?;

        Ok(Self {
            hosts,
            proxy: proxy.filter(|x| !x.url.is_empty()),
            http,
        })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn request_url(&self, host: &str) -> String {
        let destination = match &self.proxy {
            Some(proxy) => &proxy.url,
            None => host,
        };
        format!("{}/jolokia/", with_scheme(destination))
    }

    pub fn request_payload(&self, host: &str) -> Vec<ReadRequest> {
        let target = self.proxy.as_ref().map(|x| ProxyTarget::new(host, x));
        BROKER_MBEANS
            .iter()
            .map(|mbean| ReadRequest::new(mbean, target.clone()))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_host(&self, host: &str) -> Result<HostMetrics, MetricsFetchError> {
        let url = self.request_url(host);

        let response = self
            .http
            .post(&url)
            .json(&self.request_payload(host))
            .send()
            .await
            .map_err(|source| MetricsFetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsFetchError::Status { url, status });
        }

        let responses = response
            .json::<Vec<ReadResponse>>()
            .await
            .map_err(|source| MetricsFetchError::Decode {
                url: url.clone(),
                source,
            })?;

        debug!("Got {} read result(s) from {}", responses.len(), url);

        Ok(collect_metrics(host, responses))
    }
}

/// Keeps successful reads only; failed entries are logged and left out.
pub fn collect_metrics(host: &str, responses: Vec<ReadResponse>) -> HostMetrics {
    let mut meters = BTreeMap::new();

    for response in responses {
        let Some(mbean) = response.request.and_then(|x| x.mbean) else {
            warn!("Skipping read result without mbean from {}", host);
            continue;
        };

        if response.status != OK_STATUS || response.error.is_some() {
            warn!(
                "Skipping {} from {}: status {}, {}",
                mbean,
                host,
                response.status,
                response.error.as_deref().unwrap_or("no error message")
            );
            continue;
        }

        let Some(value) = response.value else {
            warn!("Skipping {} from {}: no value", mbean, host);
            continue;
        };

        match serde_json::from_value::<MeterMetric>(value) {
            Ok(meter) => {
                meters.insert(mbean_short_name(&mbean).to_owned(), meter);
            }
            Err(e) => warn!("Skipping {} from {}: {}", mbean, host, e),
        }
    }

    HostMetrics::new(host, meters)
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("//") {
        format!("http:{}", url)
    } else if !url.contains("://") {
        format!("http://{}", url)
    } else {
        url.to_owned()
    }
}
