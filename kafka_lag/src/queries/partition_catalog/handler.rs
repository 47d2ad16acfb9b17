use crate::cluster::ClusterClient;
use crate::error::LagError;
use crate::queries::partition_catalog::PartitionCatalog;
use anyhow::anyhow;
use tracing::debug;

/// Partitions of every topic in `topics`. One unavailable topic fails the
/// whole catalog.
#[tracing::instrument(skip_all)]
pub async fn get_partition_catalog<C>(
    client: &C,
    topics: &[String],
) -> Result<PartitionCatalog, LagError>
where
    C: ClusterClient + ?Sized,
{
    let mut catalog = PartitionCatalog::default();

    for topic in topics {
        if catalog.contains_topic(topic) {
            continue;
        }

        let partitions = client
            .partitions(topic)
            .await
            .map_err(|source| LagError::Catalog {
                topic: topic.clone(),
                source,
            })?;

        if partitions.is_empty() {
            return Err(LagError::Catalog {
                topic: topic.clone(),
                source: anyhow!("Topic has no partitions"),
            });
        }

        debug!("Topic {} has {} partitions", topic, partitions.len());
        catalog.insert(topic.clone(), partitions);
    }

    Ok(catalog)
}
