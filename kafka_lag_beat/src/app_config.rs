use anyhow::{bail, Context};
use config::{Config, ConfigBuilder};
use config::builder::DefaultState;
use jolokia_client::ProxyConfig;
use kafka_lag::connection_settings::ConnectionSettings;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    pub consumer_group: String,
    pub topics: Vec<String>,
    pub hosts: Vec<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub jolokia: Option<JolokiaConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JolokiaConfig {
    pub hosts: Vec<String>,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_period_ms() -> u64 {
    1000
}

fn default_client_id() -> String {
    "kafka-lag-beat".to_owned()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl AppConfig {
    pub fn build() -> Result<Self, anyhow::Error> {
        let builder = Config::builder()
            .add_source(config::File::with_name("appsettings"))
            .add_source(config::Environment::with_prefix("App").separator("__"));

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, anyhow::Error> {
        let config = builder.build().context("While building config")?;

        let deserialized_config: AppConfig = config
            .try_deserialize()
            .context("While deserializing config")?;

        deserialized_config
            .validate()
            .context("While validating config")?;

        info!("App config: {deserialized_config:?}");

        Ok(deserialized_config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.consumer_group.is_empty() {
            bail!("consumer_group is empty")
        }
        if self.topics.is_empty() {
            bail!("No topics specified")
        }
        if self.hosts.is_empty() {
            bail!("No hosts specified")
        }
        if self.period_ms == 0 {
            bail!("period_ms must be greater than zero")
        }
        if let Some(jolokia) = &self.jolokia {
            if jolokia.timeout_ms == 0 {
                bail!("jolokia.timeout_ms must be greater than zero")
            }
        }

        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            brokers: self.hosts.clone(),
            client_id: self.client_id.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

impl JolokiaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
