use anyhow::bail;
use rdkafka::ClientConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub brokers: Vec<String>,
    pub client_id: String,
    pub request_timeout: Duration,
}

impl TryFrom<&ConnectionSettings> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(value: &ConnectionSettings) -> Result<Self, Self::Error> {
        if value.brokers.is_empty() {
            bail!("No brokers specified")
        }

        let mut config = ClientConfig::new();

        let brokers_string = value.brokers.join(",");
        config
            .set("bootstrap.servers", brokers_string)
            .set("client.id", &value.client_id)
            .set("allow.auto.create.topics", "false")
            .set(
                "socket.timeout.ms",
                value.request_timeout.as_millis().to_string(),
            );

        if let Ok(value) = std::env::var("RD_KAFKA_DEBUG") {
            config.set("debug", value);
        }

        Ok(config)
    }
}
