use crate::cluster::ClusterClient;
use crate::error::LagError;
use crate::queries::broker_offsets::fetch_broker_offsets;
use crate::queries::consumer_offsets::fetch_consumer_offsets;
use crate::queries::group_coordinator::resolve_group_coordinator;
use crate::queries::partition_catalog::{get_partition_catalog, PartitionCatalog};
use crate::queries::topic_lags::{GetTopicLagsQuery, LagRecord};
use crate::queries::PartitionOffsets;
use tracing::{debug, info};

/// One measurement: catalog, then committed and latest offsets side by side,
/// then the merge. Any failure aborts with no records.
#[tracing::instrument(skip_all, fields(group = %query.group))]
pub async fn get_topic_lags<C>(client: &C, query: &GetTopicLagsQuery) -> Result<Vec<LagRecord>, LagError>
where
    C: ClusterClient + ?Sized,
{
    let catalog = get_partition_catalog(client, &query.topics).await?;
    if catalog.is_empty() {
        info!("No partitions to monitor");
        return Ok(vec![]);
    }

    let consumer_offsets = async {
        let coordinator = resolve_group_coordinator(client, &query.group).await?;
        fetch_consumer_offsets(client, coordinator, &query.group, &catalog).await
    };
    let broker_offsets = fetch_broker_offsets(client, &catalog);

    let (consumer_offsets, broker_offsets) = tokio::try_join!(consumer_offsets, broker_offsets)?;

    let lags = aggregate_lags(&query.group, &catalog, &consumer_offsets, &broker_offsets);
    debug!("Computed {} lag records", lags.len());

    Ok(lags)
}

/// One record per catalog partition; offsets missing from either map count as 0.
pub fn aggregate_lags(
    group: &str,
    catalog: &PartitionCatalog,
    consumer_offsets: &PartitionOffsets,
    broker_offsets: &PartitionOffsets,
) -> Vec<LagRecord> {
    catalog
        .iter()
        .map(|(topic, partition)| {
            LagRecord::new(
                group,
                topic,
                partition,
                consumer_offsets.get(topic, partition).unwrap_or(0),
                broker_offsets.get(topic, partition).unwrap_or(0),
            )
        })
        .collect()
}
