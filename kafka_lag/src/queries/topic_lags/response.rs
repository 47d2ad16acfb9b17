use getset::{CopyGetters, Getters};

/// Lag of one consumer group on one partition, as measured in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct LagRecord {
    #[getset(get = "pub")]
    group: String,
    #[getset(get = "pub")]
    topic: String,
    #[getset(get_copy = "pub")]
    partition: i32,
    #[getset(get_copy = "pub")]
    consumer_offset: i64,
    #[getset(get_copy = "pub")]
    broker_offset: i64,
    #[getset(get_copy = "pub")]
    lag: i64,
}

impl LagRecord {
    /// Negative raw offsets mean "unknown" and count as 0. The lag itself is
    /// left signed: a consumer ahead of the watermark shows up as negative lag.
    pub fn new(
        group: &str,
        topic: &str,
        partition: i32,
        raw_consumer_offset: i64,
        raw_broker_offset: i64,
    ) -> Self {
        let consumer_offset = raw_consumer_offset.max(0);
        let broker_offset = raw_broker_offset.max(0);

        Self {
            group: group.to_owned(),
            topic: topic.to_owned(),
            partition,
            consumer_offset,
            broker_offset,
            lag: broker_offset - consumer_offset,
        }
    }
}
