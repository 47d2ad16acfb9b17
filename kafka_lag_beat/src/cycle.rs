use crate::events::Event;
use crate::publisher::EventPublisher;
use chrono::Utc;
use futures::future::join_all;
use jolokia_client::{HostMetrics, JolokiaClient};
use kafka_lag::cluster::ClusterClient;
use kafka_lag::policy::{settle, FetchPath};
use kafka_lag::queries::topic_lags::{get_topic_lags, GetTopicLagsQuery, LagRecord};
use std::sync::Arc;
use tracing::{debug, error};

/// Counts of what one cycle published.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub offset_events: usize,
    pub jmx_events: usize,
}

/// Everything a single measurement needs; shared by all cycles.
pub struct Cycle {
    cluster: Arc<dyn ClusterClient>,
    jolokia: Option<JolokiaClient>,
    publisher: Arc<dyn EventPublisher>,
    query: GetTopicLagsQuery,
}

impl Cycle {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        jolokia: Option<JolokiaClient>,
        publisher: Arc<dyn EventPublisher>,
        query: GetTopicLagsQuery,
    ) -> Self {
        Self {
            cluster,
            jolokia,
            publisher,
            query,
        }
    }

    pub async fn run(&self) -> CycleReport {
        let (lags, metrics) = tokio::join!(self.lags(), self.metrics());

        let timestamp = Utc::now();
        let mut events = lags
            .iter()
            .map(|x| Event::offset(timestamp, x))
            .collect::<Vec<_>>();
        events.extend(metrics.iter().map(|x| Event::jmx(timestamp, x)));

        let report = CycleReport {
            offset_events: lags.len(),
            jmx_events: metrics.len(),
        };

        if let Err(e) = self.publisher.publish(&events) {
            error!("Error while publishing {} event(s): {:?}", events.len(), e);
            return CycleReport::default();
        }

        debug!("Cycle published {:?}", report);
        report
    }

    async fn lags(&self) -> Vec<LagRecord> {
        match get_topic_lags(self.cluster.as_ref(), &self.query).await {
            Ok(lags) => lags,
            Err(e) => {
                error!("Lag measurement aborted: {:?}", anyhow::Error::from(e));
                vec![]
            }
        }
    }

    async fn metrics(&self) -> Vec<HostMetrics> {
        let Some(jolokia) = &self.jolokia else {
            return vec![];
        };

        let results = join_all(jolokia.hosts().iter().map(|x| jolokia.fetch_host(x))).await;

        // Failed hosts are logged and dropped by the skip policy.
        settle(FetchPath::BrokerMetrics.policy(), results).unwrap_or_default()
    }
}
