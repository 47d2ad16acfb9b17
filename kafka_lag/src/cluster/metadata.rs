use getset::Getters;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct BrokerAddress {
    host: String,
    port: u16,
}

impl BrokerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Display for BrokerAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Metadata of one topic as reported by the cluster.
#[derive(Debug, Clone)]
pub struct TopicMetadata {
    pub name: String,
    /// Partition id and leader broker id (`-1` when leaderless).
    pub partitions: Vec<(i32, i32)>,
}

/// Last known cluster layout. The broker list and each topic entry are
/// replaced wholesale on refresh.
#[derive(Debug, Default)]
pub struct ClusterSnapshot {
    brokers: HashMap<i32, BrokerAddress>,
    leaders: HashMap<String, HashMap<i32, i32>>,
}

impl ClusterSnapshot {
    pub fn register_broker(&mut self, id: i32, address: BrokerAddress) {
        self.brokers.insert(id, address);
    }

    /// Brokers absent from `brokers` have left the cluster and are forgotten.
    pub fn replace_brokers(&mut self, brokers: Vec<(i32, BrokerAddress)>) {
        self.brokers = brokers.into_iter().collect();
    }

    pub fn replace_topic(&mut self, topic: TopicMetadata) {
        let leaders = topic.partitions.into_iter().collect();
        self.leaders.insert(topic.name, leaders);
    }

    pub fn broker(&self, id: i32) -> Option<&BrokerAddress> {
        self.brokers.get(&id)
    }

    /// Known broker ids, lowest first so the order is stable.
    pub fn broker_ids(&self) -> Vec<i32> {
        let mut ids = self.brokers.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    pub fn leader(&self, topic: &str, partition: i32) -> Option<i32> {
        self.leaders
            .get(topic)
            .and_then(|x| x.get(&partition))
            .copied()
            .filter(|leader| *leader >= 0)
    }
}
