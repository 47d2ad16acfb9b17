mod broker_connection;
mod broker_pool;
mod metadata;
mod metadata_client;

pub use broker_connection::*;
pub use broker_pool::*;
pub use metadata::*;
pub use metadata_client::*;

use async_trait::async_trait;
use kafka_protocol::error::ResponseError;
use kafka_protocol::messages::{
    BrokerId, ListOffsetsRequest, ListOffsetsResponse, OffsetFetchRequest, OffsetFetchResponse,
};

/// Protocol versions spoken to individual brokers.
pub const FIND_COORDINATOR_VERSION: i16 = 1;
pub const OFFSET_FETCH_VERSION: i16 = 1;
pub const LIST_OFFSETS_VERSION: i16 = 1;

/// Everything the lag engine needs from the cluster.
///
/// Requests are addressed by broker id; the implementation owns the mapping
/// from id to a live connection.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Partition ids of `topic`. Refreshes the topic's leaders as a side effect.
    async fn partitions(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error>;

    async fn coordinator(&self, group: &str) -> Result<BrokerId, anyhow::Error>;

    async fn leader(&self, topic: &str, partition: i32) -> Result<BrokerId, anyhow::Error>;

    async fn fetch_offsets(
        &self,
        broker: BrokerId,
        request: OffsetFetchRequest,
    ) -> Result<OffsetFetchResponse, anyhow::Error>;

    async fn list_offsets(
        &self,
        broker: BrokerId,
        request: ListOffsetsRequest,
    ) -> Result<ListOffsetsResponse, anyhow::Error>;
}

/// Human readable form of a protocol error code, e.g. `3 (UnknownTopicOrPartition)`.
pub fn error_code_name(code: i16) -> String {
    match ResponseError::try_from_code(code) {
        Some(error) => format!("{} ({:?})", code, error),
        None => format!("{} (unknown)", code),
    }
}
