use crate::cluster::{
    broker_address, error_code_name, BrokerAddress, BrokerConnection, ClusterClient,
    ClusterSnapshot, MetadataClient, MetadataReply, FIND_COORDINATOR_VERSION,
    LIST_OFFSETS_VERSION, OFFSET_FETCH_VERSION,
};
use crate::connection_settings::ConnectionSettings;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use kafka_protocol::messages::{
    ApiKey, BrokerId, FindCoordinatorRequest, FindCoordinatorResponse, ListOffsetsRequest,
    ListOffsetsResponse, OffsetFetchRequest, OffsetFetchResponse,
};
use kafka_protocol::protocol::{Decodable, Encodable, StrBytes};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const GROUP_KEY_TYPE: i8 = 0;

/// Long-lived cluster session: librdkafka for metadata, one native connection
/// per broker id for offset requests.
pub struct BrokerPool {
    settings: ConnectionSettings,
    metadata_client: Arc<MetadataClient>,
    snapshot: RwLock<ClusterSnapshot>,
    connections: Mutex<HashMap<i32, Arc<BrokerConnection>>>,
}

impl BrokerPool {
    pub fn create(settings: ConnectionSettings) -> Result<Self, anyhow::Error> {
        Self::with_snapshot(settings, ClusterSnapshot::default())
    }

    /// Starts from a known cluster layout instead of an empty one.
    pub fn with_snapshot(
        settings: ConnectionSettings,
        snapshot: ClusterSnapshot,
    ) -> Result<Self, anyhow::Error> {
        let metadata_client =
            MetadataClient::create(&settings).context("While creating metadata client")?;

        info!("Broker pool created. Bootstrap: {:?}", settings.brokers);

        Ok(Self {
            settings,
            metadata_client: Arc::new(metadata_client),
            snapshot: RwLock::new(snapshot),
            connections: Mutex::new(HashMap::new()),
        })
    }

    /// Drops every open broker connection. The pool can still be used
    /// afterwards, connections are re-established on demand.
    pub async fn close(&self) {
        let mut connections = self.connections.lock().await;
        info!("Closing {} broker connection(s)", connections.len());
        connections.clear();
    }

    /// Re-reads `topic` from the cluster and returns its partition ids.
    async fn refresh_topic(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        let client = self.metadata_client.clone();
        let timeout = self.settings.request_timeout;
        let topic_owned = topic.to_owned();
        let reply = tokio::task::spawn_blocking(move || client.fetch_topic(&topic_owned, timeout))
            .await
            .context("While joining metadata handle")??;

        let partitions = reply
            .topic
            .as_ref()
            .map(|x| x.partitions.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default();

        self.apply(reply).await;
        Ok(partitions)
    }

    async fn refresh_brokers(&self) -> Result<(), anyhow::Error> {
        let client = self.metadata_client.clone();
        let timeout = self.settings.request_timeout;
        let reply = tokio::task::spawn_blocking(move || client.fetch_brokers(timeout))
            .await
            .context("While joining metadata handle")??;

        self.apply(reply).await;
        Ok(())
    }

    async fn apply(&self, reply: MetadataReply) {
        let mut snapshot = self.snapshot.write().await;
        // A metadata reply lists every live broker.
        if !reply.brokers.is_empty() {
            snapshot.replace_brokers(reply.brokers);
        }
        if let Some(topic) = reply.topic {
            snapshot.replace_topic(topic);
        }
    }

    async fn connection(&self, broker: BrokerId) -> Result<Arc<BrokerConnection>, anyhow::Error> {
        let cached = self.connections.lock().await.get(&broker.0).cloned();
        if let Some(connection) = cached {
            return Ok(connection);
        }

        let address = self.address(broker).await?;
        let connection = BrokerConnection::connect(
            broker,
            &address.to_string(),
            &self.settings.client_id,
            self.settings.request_timeout,
        )
        .await?;

        // Another task may have connected meanwhile; its connection wins.
        let mut connections = self.connections.lock().await;
        Ok(connections
            .entry(broker.0)
            .or_insert_with(|| Arc::new(connection))
            .clone())
    }

    async fn address(&self, broker: BrokerId) -> Result<BrokerAddress, anyhow::Error> {
        if let Some(address) = self.snapshot.read().await.broker(broker.0) {
            return Ok(address.clone());
        }

        debug!("Broker {} is unknown, refreshing metadata", broker.0);
        self.refresh_brokers().await?;

        self.snapshot
            .read()
            .await
            .broker(broker.0)
            .cloned()
            .with_context(|| format!("Broker {} isn't part of the cluster metadata", broker.0))
    }

    async fn send<Req, Resp>(
        &self,
        broker: BrokerId,
        api_key: ApiKey,
        version: i16,
        request: &Req,
    ) -> Result<Resp, anyhow::Error>
    where
        Req: Encodable + Sync,
        Resp: Decodable + Send,
    {
        let connection = self.connection(broker).await?;
        let result = tokio::time::timeout(
            self.settings.request_timeout,
            connection.send::<Req, Resp>(api_key, version, request),
        )
        .await
        .map_err(|_| anyhow!("{:?} request to broker {} timed out", api_key, broker.0))
        .and_then(|x| x);

        if result.is_err() {
            // The stream may hold a half-read frame, never reuse it.
            let mut connections = self.connections.lock().await;
            if connections
                .get(&broker.0)
                .is_some_and(|x| Arc::ptr_eq(x, &connection))
            {
                warn!("Evicting connection to broker {}", connection.broker_id().0);
                connections.remove(&broker.0);
            }
        }

        result
    }

    async fn accept_coordinator(
        &self,
        group: &str,
        response: FindCoordinatorResponse,
    ) -> Result<BrokerId, anyhow::Error> {
        if response.error_code != 0 {
            bail!(
                "FindCoordinator failed: {}",
                error_code_name(response.error_code)
            )
        }

        let address = broker_address(response.host.as_str(), response.port)
            .context("While reading coordinator address")?;
        self.snapshot
            .write()
            .await
            .register_broker(response.node_id.0, address);

        debug!("Coordinator of group {} is broker {}", group, response.node_id.0);
        Ok(response.node_id)
    }
}

#[async_trait]
impl ClusterClient for BrokerPool {
    async fn partitions(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        self.refresh_topic(topic).await
    }

    /// Asks known brokers in id order. When none of them answers, the broker
    /// list is refreshed once and brokers not asked yet are tried.
    async fn coordinator(&self, group: &str) -> Result<BrokerId, anyhow::Error> {
        let request = FindCoordinatorRequest::default()
            .with_key(StrBytes::from_string(group.to_owned()))
            .with_key_type(GROUP_KEY_TYPE);

        let mut asked = HashSet::new();
        let mut last_error = None;

        for attempt in 0..2 {
            if attempt > 0 || self.snapshot.read().await.broker_ids().is_empty() {
                self.refresh_brokers()
                    .await
                    .context("While refreshing brokers for coordinator lookup")?;
            }

            let candidates = self.snapshot.read().await.broker_ids();
            for broker in candidates.into_iter().filter(|x| asked.insert(*x)) {
                let response: FindCoordinatorResponse = match self
                    .send(
                        BrokerId(broker),
                        ApiKey::FindCoordinator,
                        FIND_COORDINATOR_VERSION,
                        &request,
                    )
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("FindCoordinator via broker {} failed: {:#}", broker, e);
                        last_error = Some(e);
                        continue;
                    }
                };

                return self.accept_coordinator(group, response).await;
            }
        }

        let error = last_error.unwrap_or_else(|| anyhow!("Cluster metadata has no brokers"));
        Err(error.context(format!("While looking up coordinator of group {}", group)))
    }

    async fn leader(&self, topic: &str, partition: i32) -> Result<BrokerId, anyhow::Error> {
        if let Some(leader) = self.snapshot.read().await.leader(topic, partition) {
            return Ok(BrokerId(leader));
        }

        debug!("No leader cached for {}/{}, refreshing metadata", topic, partition);
        self.refresh_topic(topic).await?;

        self.snapshot
            .read()
            .await
            .leader(topic, partition)
            .map(BrokerId)
            .with_context(|| format!("Partition {}/{} has no leader", topic, partition))
    }

    async fn fetch_offsets(
        &self,
        broker: BrokerId,
        request: OffsetFetchRequest,
    ) -> Result<OffsetFetchResponse, anyhow::Error> {
        self.send(broker, ApiKey::OffsetFetch, OFFSET_FETCH_VERSION, &request)
            .await
    }

    async fn list_offsets(
        &self,
        broker: BrokerId,
        request: ListOffsetsRequest,
    ) -> Result<ListOffsetsResponse, anyhow::Error> {
        self.send(broker, ApiKey::ListOffsets, LIST_OFFSETS_VERSION, &request)
            .await
    }
}
