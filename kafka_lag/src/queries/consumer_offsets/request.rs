use crate::queries::partition_catalog::PartitionCatalog;
use kafka_protocol::messages::offset_fetch_request::OffsetFetchRequestTopic;
use kafka_protocol::messages::{GroupId, OffsetFetchRequest, TopicName};
use kafka_protocol::protocol::StrBytes;

/// A single OffsetFetch enumerating every catalog partition.
pub fn build_offset_fetch_request(group: &str, catalog: &PartitionCatalog) -> OffsetFetchRequest {
    let topics = catalog
        .topics()
        .map(|(topic, partitions)| {
            OffsetFetchRequestTopic::default()
                .with_name(TopicName(StrBytes::from_string(topic.to_owned())))
                .with_partition_indexes(partitions.to_vec())
        })
        .collect();

    OffsetFetchRequest::default()
        .with_group_id(GroupId(StrBytes::from_string(group.to_owned())))
        .with_topics(Some(topics))
}
