use kafka_protocol::messages::BrokerId;
use thiserror::Error;

/// Failures of the lag path. Every variant aborts the current cycle.
#[derive(Debug, Error)]
pub enum LagError {
    #[error("Partition catalog unavailable for topic '{topic}'")]
    Catalog {
        topic: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Coordinator of group '{group}' couldn't be resolved")]
    Coordinator {
        group: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Leader of topic '{topic}' partition {partition} couldn't be resolved")]
    LeaderResolution {
        topic: String,
        partition: i32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Committed offsets of group '{group}' couldn't be fetched from broker {}", broker.0)]
    OffsetFetch {
        group: String,
        broker: BrokerId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Latest offsets couldn't be fetched from broker {}", broker.0)]
    BrokerOffset {
        broker: BrokerId,
        #[source]
        source: anyhow::Error,
    },
}
