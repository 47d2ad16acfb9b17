use crate::cluster::{error_code_name, ClusterClient};
use crate::error::LagError;
use crate::queries::consumer_offsets::build_offset_fetch_request;
use crate::queries::partition_catalog::PartitionCatalog;
use crate::queries::PartitionOffsets;
use anyhow::bail;
use kafka_protocol::messages::{BrokerId, OffsetFetchResponse};
use std::collections::HashMap;
use tracing::debug;

/// Committed offsets of `group` for every catalog partition, read from its
/// coordinator in one request.
#[tracing::instrument(skip_all, fields(group = group, coordinator = coordinator.0))]
pub async fn fetch_consumer_offsets<C>(
    client: &C,
    coordinator: BrokerId,
    group: &str,
    catalog: &PartitionCatalog,
) -> Result<PartitionOffsets, LagError>
where
    C: ClusterClient + ?Sized,
{
    let to_error = |source| LagError::OffsetFetch {
        group: group.to_owned(),
        broker: coordinator,
        source,
    };

    let request = build_offset_fetch_request(group, catalog);
    let response = client
        .fetch_offsets(coordinator, request)
        .await
        .map_err(to_error)?;

    let offsets = parse_offset_fetch_response(catalog, &response).map_err(to_error)?;
    debug!(
        "Got {} committed offsets for {} partitions",
        offsets.len(),
        catalog.len()
    );

    Ok(offsets)
}

/// Any per-partition error fails the whole response. Partitions the broker
/// didn't answer for have no committed offset and are left out.
pub fn parse_offset_fetch_response(
    catalog: &PartitionCatalog,
    response: &OffsetFetchResponse,
) -> Result<PartitionOffsets, anyhow::Error> {
    if response.error_code != 0 {
        bail!("OffsetFetch failed: {}", error_code_name(response.error_code))
    }

    let blocks = response
        .topics
        .iter()
        .flat_map(|topic| {
            topic.partitions.iter().map(move |partition| {
                (
                    (topic.name.as_str(), partition.partition_index),
                    (partition.committed_offset, partition.error_code),
                )
            })
        })
        .collect::<HashMap<_, _>>();

    let mut offsets = PartitionOffsets::default();
    for (topic, partition) in catalog.iter() {
        let Some((offset, error_code)) = blocks.get(&(topic, partition)) else {
            continue;
        };

        if *error_code != 0 {
            bail!(
                "OffsetFetch failed for {}/{}: {}",
                topic,
                partition,
                error_code_name(*error_code)
            )
        }

        offsets.insert(topic, partition, *offset);
    }

    Ok(offsets)
}
