use std::collections::BTreeMap;

/// Monitored partitions of one cycle: topic -> sorted, unique partition ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionCatalog {
    topics: BTreeMap<String, Vec<i32>>,
}

impl PartitionCatalog {
    pub fn insert(&mut self, topic: String, partitions: impl IntoIterator<Item = i32>) {
        let mut partitions = partitions.into_iter().collect::<Vec<_>>();
        partitions.sort_unstable();
        partitions.dedup();
        self.topics.insert(topic, partitions);
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = (&str, &[i32])> {
        self.topics
            .iter()
            .map(|(topic, partitions)| (topic.as_str(), partitions.as_slice()))
    }

    /// Every (topic, partition) pair, topic order then partition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.topics().flat_map(|(topic, partitions)| {
            partitions.iter().map(move |partition| (topic, *partition))
        })
    }

    pub fn len(&self) -> usize {
        self.topics.values().map(|x| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
