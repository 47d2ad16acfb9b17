use crate::queries::partition_catalog::PartitionCatalog;
use kafka_protocol::messages::list_offsets_request::{ListOffsetsPartition, ListOffsetsTopic};
use kafka_protocol::messages::{BrokerId, ListOffsetsRequest, TopicName};
use kafka_protocol::protocol::StrBytes;
use std::collections::BTreeMap;

/// ListOffsets timestamp asking for the offset of the next record to be written.
pub const NEWEST_OFFSET: i64 = -1;
const CONSUMER_REPLICA_ID: i32 = -1;

/// Catalog partitions grouped by the broker id of their current leader.
pub type LeaderBatches = BTreeMap<i32, PartitionCatalog>;

pub fn group_by_leader<I>(leaders: I) -> LeaderBatches
where
    I: IntoIterator<Item = (i32, String, i32)>,
{
    let mut grouped: BTreeMap<i32, BTreeMap<String, Vec<i32>>> = BTreeMap::new();
    for (leader, topic, partition) in leaders {
        grouped
            .entry(leader)
            .or_default()
            .entry(topic)
            .or_default()
            .push(partition);
    }

    grouped
        .into_iter()
        .map(|(leader, topics)| {
            let mut batch = PartitionCatalog::default();
            for (topic, partitions) in topics {
                batch.insert(topic, partitions);
            }
            (leader, batch)
        })
        .collect()
}

/// One "newest offset" request covering every partition of `batch`.
pub fn build_list_offsets_request(batch: &PartitionCatalog, version: i16) -> ListOffsetsRequest {
    let topics = batch
        .topics()
        .map(|(topic, partitions)| {
            let partitions = partitions
                .iter()
                .map(|partition| {
                    let request = ListOffsetsPartition::default()
                        .with_partition_index(*partition)
                        .with_timestamp(NEWEST_OFFSET);
                    // v0 returns a list of offsets, only the newest one is needed
                    if version == 0 {
                        request.with_max_num_offsets(1)
                    } else {
                        request
                    }
                })
                .collect();

            ListOffsetsTopic::default()
                .with_name(TopicName(StrBytes::from_string(topic.to_owned())))
                .with_partitions(partitions)
        })
        .collect();

    ListOffsetsRequest::default()
        .with_replica_id(BrokerId(CONSUMER_REPLICA_ID))
        .with_topics(topics)
}
