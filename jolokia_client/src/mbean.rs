/// Broker meters read from every host each cycle.
pub const BROKER_MBEANS: [&str; 6] = [
    "kafka.server:type=BrokerTopicMetrics,name=MessagesInPerSec",
    "kafka.server:type=BrokerTopicMetrics,name=BytesInPerSec",
    "kafka.server:type=BrokerTopicMetrics,name=BytesOutPerSec",
    "kafka.server:type=BrokerTopicMetrics,name=BytesRejectedPerSec",
    "kafka.server:type=BrokerTopicMetrics,name=FailedProduceRequestsPerSec",
    "kafka.server:type=BrokerTopicMetrics,name=FailedFetchRequestsPerSec",
];

/// Value of the `name` property of an object name such as
/// `kafka.server:type=BrokerTopicMetrics,name=BytesInPerSec`.
///
/// Returns an empty string when the id has no property list or no `name`.
pub fn mbean_short_name(mbean: &str) -> &str {
    let Some(properties) = mbean.split(':').nth(1) else {
        return "";
    };

    for property in properties.split(',') {
        let mut pair = property.split('=');
        if pair.next() == Some("name") {
            return pair.next().unwrap_or("");
        }
    }

    ""
}
