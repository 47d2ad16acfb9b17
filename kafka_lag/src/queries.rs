pub mod broker_offsets;
pub mod consumer_offsets;
pub mod group_coordinator;
pub mod partition_catalog;
pub mod topic_lags;

use std::collections::HashMap;

/// Raw offsets as returned by the brokers, keyed by topic then partition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionOffsets {
    offsets: HashMap<String, HashMap<i32, i64>>,
}

impl PartitionOffsets {
    pub fn insert(&mut self, topic: &str, partition: i32, offset: i64) {
        self.offsets
            .entry(topic.to_owned())
            .or_default()
            .insert(partition, offset);
    }

    pub fn get(&self, topic: &str, partition: i32) -> Option<i64> {
        self.offsets.get(topic)?.get(&partition).copied()
    }

    pub fn extend(&mut self, other: PartitionOffsets) {
        for (topic, partitions) in other.offsets {
            self.offsets.entry(topic).or_default().extend(partitions);
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.values().map(|x| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
