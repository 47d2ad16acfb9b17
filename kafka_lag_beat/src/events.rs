use chrono::{DateTime, Utc};
use jolokia_client::{HostMetrics, MeterMetric};
use kafka_lag::queries::topic_lags::LagRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// One output line.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: EventBody,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventBody {
    Offset { offset: OffsetEvent },
    Jmx { jmx: JmxEvent },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OffsetEvent {
    pub group: String,
    pub topic: String,
    pub partition: i32,
    pub consumer_offset: i64,
    pub broker_offset: i64,
    pub lag: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JmxEvent {
    pub host: String,
    #[serde(flatten)]
    pub meters: BTreeMap<String, MeterMetric>,
}

impl Event {
    pub fn offset(timestamp: DateTime<Utc>, record: &LagRecord) -> Self {
        Self {
            timestamp,
            body: EventBody::Offset {
                offset: OffsetEvent::from(record),
            },
        }
    }

    pub fn jmx(timestamp: DateTime<Utc>, metrics: &HostMetrics) -> Self {
        Self {
            timestamp,
            body: EventBody::Jmx {
                jmx: JmxEvent::from(metrics),
            },
        }
    }
}

impl From<&LagRecord> for OffsetEvent {
    fn from(value: &LagRecord) -> Self {
        Self {
            group: value.group().clone(),
            topic: value.topic().clone(),
            partition: value.partition(),
            consumer_offset: value.consumer_offset(),
            broker_offset: value.broker_offset(),
            lag: value.lag(),
        }
    }
}

impl From<&HostMetrics> for JmxEvent {
    fn from(value: &HostMetrics) -> Self {
        Self {
            host: value.host().clone(),
            meters: value.meters().clone(),
        }
    }
}
