use crate::cluster::{error_code_name, ClusterClient, LIST_OFFSETS_VERSION};
use crate::error::LagError;
use crate::policy::{settle, FetchPath};
use crate::queries::broker_offsets::{build_list_offsets_request, group_by_leader, LeaderBatches};
use crate::queries::partition_catalog::PartitionCatalog;
use crate::queries::PartitionOffsets;
use anyhow::{bail, Context};
use kafka_protocol::messages::{BrokerId, ListOffsetsResponse};
use std::collections::HashMap;
use tracing::debug;

/// Last written offset of every catalog partition.
///
/// Partitions are grouped by leader and each leader gets exactly one request;
/// the requests run concurrently.
#[tracing::instrument(skip_all)]
pub async fn fetch_broker_offsets<C>(
    client: &C,
    catalog: &PartitionCatalog,
) -> Result<PartitionOffsets, LagError>
where
    C: ClusterClient + ?Sized,
{
    let batches = resolve_leaders(client, catalog).await?;
    debug!(
        "{} partitions are led by {} brokers",
        catalog.len(),
        batches.len()
    );

    let requests = batches
        .into_iter()
        .map(|(leader, batch)| fetch_leader_offsets(client, BrokerId(leader), batch));
    let results = futures::future::join_all(requests).await;

    let mut offsets = PartitionOffsets::default();
    for leader_offsets in settle(FetchPath::ConsumerLag.policy(), results)? {
        offsets.extend(leader_offsets);
    }

    Ok(offsets)
}

async fn resolve_leaders<C>(client: &C, catalog: &PartitionCatalog) -> Result<LeaderBatches, LagError>
where
    C: ClusterClient + ?Sized,
{
    let mut leaders = Vec::with_capacity(catalog.len());
    for (topic, partition) in catalog.iter() {
        let leader = client
            .leader(topic, partition)
            .await
            .map_err(|source| LagError::LeaderResolution {
                topic: topic.to_owned(),
                partition,
                source,
            })?;
        leaders.push((leader.0, topic.to_owned(), partition));
    }

    Ok(group_by_leader(leaders))
}

async fn fetch_leader_offsets<C>(
    client: &C,
    leader: BrokerId,
    batch: PartitionCatalog,
) -> Result<PartitionOffsets, LagError>
where
    C: ClusterClient + ?Sized,
{
    let to_error = |source| LagError::BrokerOffset {
        broker: leader,
        source,
    };

    let request = build_list_offsets_request(&batch, LIST_OFFSETS_VERSION);
    let response = client
        .list_offsets(leader, request)
        .await
        .map_err(to_error)?;

    parse_list_offsets_response(&batch, &response, LIST_OFFSETS_VERSION).map_err(to_error)
}

/// Every requested partition has to be answered without error. The broker
/// reports the next offset to be written, the stored value is one less.
pub fn parse_list_offsets_response(
    batch: &PartitionCatalog,
    response: &ListOffsetsResponse,
    version: i16,
) -> Result<PartitionOffsets, anyhow::Error> {
    let blocks = response
        .topics
        .iter()
        .flat_map(|topic| {
            topic
                .partitions
                .iter()
                .map(move |partition| ((topic.name.as_str(), partition.partition_index), partition))
        })
        .collect::<HashMap<_, _>>();

    let mut offsets = PartitionOffsets::default();
    for (topic, partition) in batch.iter() {
        let block = blocks
            .get(&(topic, partition))
            .with_context(|| format!("Incomplete response, {}/{} is missing", topic, partition))?;

        if block.error_code != 0 {
            bail!(
                "ListOffsets failed for {}/{}: {}",
                topic,
                partition,
                error_code_name(block.error_code)
            )
        }

        let next_offset = if version == 0 {
            block.old_style_offsets.first().copied()
        } else {
            Some(block.offset)
        };
        let next_offset = next_offset
            .with_context(|| format!("No offsets returned for {}/{}", topic, partition))?;

        offsets.insert(topic, partition, next_offset.saturating_sub(1));
    }

    Ok(offsets)
}
