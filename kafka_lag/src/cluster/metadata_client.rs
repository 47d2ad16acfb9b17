use crate::cluster::{BrokerAddress, TopicMetadata};
use crate::connection_settings::ConnectionSettings;
use anyhow::{bail, Context};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::metadata::Metadata;
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::trace;

/// Non-consuming librdkafka client used only for cluster metadata.
pub struct MetadataClient {
    consumer: StreamConsumer,
}

pub struct MetadataReply {
    pub brokers: Vec<(i32, BrokerAddress)>,
    pub topic: Option<TopicMetadata>,
}

impl MetadataClient {
    pub fn create(settings: &ConnectionSettings) -> Result<Self, anyhow::Error> {
        // https://raw.githubusercontent.com/confluentinc/librdkafka/master/CONFIGURATION.md
        let consumer: StreamConsumer = ClientConfig::try_from(settings)?
            .set("enable.auto.commit", "false")
            .create()
            .context("While creating kafka StreamConsumer")?;

        Ok(Self { consumer })
    }

    /// Blocking. Brokers plus the partitions and leaders of `topic`.
    pub fn fetch_topic(&self, topic: &str, timeout: Duration) -> Result<MetadataReply, anyhow::Error> {
        let metadata = self
            .consumer
            .fetch_metadata(Some(topic), Timeout::After(timeout))
            .with_context(|| format!("While fetching topic '{}' metadata", topic))?;

        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|x| x.name() == topic)
            .with_context(|| format!("Topic '{}' is missing in metadata response", topic))?;

        if let Some(error) = topic_metadata.error() {
            bail!("Topic '{}' metadata error: {:?}", topic, error)
        }

        let partitions = topic_metadata
            .partitions()
            .iter()
            .map(|x| (x.id(), x.leader()))
            .collect::<Vec<_>>();

        trace!(
            "Got metadata for topic {}. Partitions: {}",
            topic,
            partitions.len()
        );

        Ok(MetadataReply {
            brokers: brokers(&metadata)?,
            topic: Some(TopicMetadata {
                name: topic.to_owned(),
                partitions,
            }),
        })
    }

    /// Blocking. Broker list only.
    pub fn fetch_brokers(&self, timeout: Duration) -> Result<MetadataReply, anyhow::Error> {
        let metadata = self
            .consumer
            .fetch_metadata(None, Timeout::After(timeout))
            .context("While fetching cluster metadata")?;

        Ok(MetadataReply {
            brokers: brokers(&metadata)?,
            topic: None,
        })
    }
}

fn brokers(metadata: &Metadata) -> Result<Vec<(i32, BrokerAddress)>, anyhow::Error> {
    metadata
        .brokers()
        .iter()
        .map(|x| Ok((x.id(), broker_address(x.host(), x.port())?)))
        .collect()
}

pub fn broker_address(host: &str, port: i32) -> Result<BrokerAddress, anyhow::Error> {
    let port = u16::try_from(port)
        .with_context(|| format!("Broker {} advertised port {} is out of range", host, port))?;
    Ok(BrokerAddress::new(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertised_port_is_kept() -> Result<(), anyhow::Error> {
        let address = broker_address("kafka-0", 9092)?;

        assert_eq!(address.to_string(), "kafka-0:9092");
        Ok(())
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(broker_address("kafka-0", -1).is_err());
        assert!(broker_address("kafka-0", 65536).is_err());
        assert!(broker_address("kafka-0", 74565).is_err());
    }
}
