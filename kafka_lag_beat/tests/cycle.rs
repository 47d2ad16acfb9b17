extern crate kafka_lag_beat;

use anyhow::bail;
use async_trait::async_trait;
use axum::http::header;
use axum::routing::post;
use axum::Router;
use jolokia_client::JolokiaClient;
use kafka_lag::cluster::ClusterClient;
use kafka_lag::queries::topic_lags::GetTopicLagsQuery;
use kafka_lag_beat::cycle::{Cycle, CycleReport};
use kafka_lag_beat::events::{Event, EventBody};
use kafka_lag_beat::publisher::EventPublisher;
use kafka_protocol::messages::list_offsets_response::{
    ListOffsetsPartitionResponse, ListOffsetsTopicResponse,
};
use kafka_protocol::messages::offset_fetch_response::{
    OffsetFetchResponsePartition, OffsetFetchResponseTopic,
};
use kafka_protocol::messages::{
    BrokerId, ListOffsetsRequest, ListOffsetsResponse, OffsetFetchRequest, OffsetFetchResponse,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Single-broker cluster where every partition has committed 10 and the
/// next offset is 16.
struct SingleBroker {
    topic: &'static str,
    partitions: Vec<i32>,
    coordinator_available: bool,
}

#[async_trait]
impl ClusterClient for SingleBroker {
    async fn partitions(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        if topic != self.topic {
            bail!("Unknown topic {topic}")
        }
        Ok(self.partitions.clone())
    }

    async fn coordinator(&self, _group: &str) -> Result<BrokerId, anyhow::Error> {
        if !self.coordinator_available {
            bail!("CoordinatorNotAvailable")
        }
        Ok(BrokerId(0))
    }

    async fn leader(&self, _topic: &str, _partition: i32) -> Result<BrokerId, anyhow::Error> {
        Ok(BrokerId(0))
    }

    async fn fetch_offsets(
        &self,
        _broker: BrokerId,
        request: OffsetFetchRequest,
    ) -> Result<OffsetFetchResponse, anyhow::Error> {
        let topics = request
            .topics
            .unwrap_or_default()
            .into_iter()
            .map(|topic| {
                let partitions = topic
                    .partition_indexes
                    .iter()
                    .map(|x| {
                        OffsetFetchResponsePartition::default()
                            .with_partition_index(*x)
                            .with_committed_offset(10)
                    })
                    .collect();
                OffsetFetchResponseTopic::default()
                    .with_name(topic.name)
                    .with_partitions(partitions)
            })
            .collect();
        Ok(OffsetFetchResponse::default().with_topics(topics))
    }

    async fn list_offsets(
        &self,
        _broker: BrokerId,
        request: ListOffsetsRequest,
    ) -> Result<ListOffsetsResponse, anyhow::Error> {
        let topics = request
            .topics
            .into_iter()
            .map(|topic| {
                let partitions = topic
                    .partitions
                    .iter()
                    .map(|x| {
                        ListOffsetsPartitionResponse::default()
                            .with_partition_index(x.partition_index)
                            .with_offset(16)
                    })
                    .collect();
                ListOffsetsTopicResponse::default()
                    .with_name(topic.name)
                    .with_partitions(partitions)
            })
            .collect();
        Ok(ListOffsetsResponse::default().with_topics(topics))
    }
}

#[derive(Default)]
struct Collecting {
    events: Mutex<Vec<Event>>,
}

impl EventPublisher for Collecting {
    fn publish(&self, events: &[Event]) -> Result<(), anyhow::Error> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

fn query() -> GetTopicLagsQuery {
    GetTopicLagsQuery {
        group: "billing".to_owned(),
        topics: vec!["orders".to_owned()],
    }
}

fn cluster(coordinator_available: bool) -> Arc<SingleBroker> {
    Arc::new(SingleBroker {
        topic: "orders",
        partitions: vec![0, 1, 2],
        coordinator_available,
    })
}

#[tokio::test]
async fn offset_event_per_partition() -> Result<(), anyhow::Error> {
    let publisher = Arc::new(Collecting::default());
    let cycle = Cycle::new(cluster(true), None, publisher.clone(), query());

    let report = cycle.run().await;

    assert_eq!(
        report,
        CycleReport {
            offset_events: 3,
            jmx_events: 0
        }
    );
    let events = publisher.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    for event in events.iter() {
        let EventBody::Offset { offset } = &event.body else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(offset.group, "billing");
        assert_eq!(offset.consumer_offset, 10);
        assert_eq!(offset.broker_offset, 15);
        assert_eq!(offset.lag, 5);
    }
    Ok(())
}

#[tokio::test]
async fn aborted_lag_path_publishes_no_offsets() {
    let publisher = Arc::new(Collecting::default());
    let cycle = Cycle::new(cluster(false), None, publisher.clone(), query());

    let report = cycle.run().await;

    assert_eq!(report, CycleReport::default());
    assert!(publisher.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_metrics_host_is_skipped() -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    drop(listener);

    let jolokia = JolokiaClient::new(vec![address], None, Duration::from_secs(1))?;
    let publisher = Arc::new(Collecting::default());
    let cycle = Cycle::new(cluster(true), Some(jolokia), publisher.clone(), query());

    let report = cycle.run().await;

    assert_eq!(report.offset_events, 3);
    assert_eq!(report.jmx_events, 0);
    Ok(())
}

const BYTES_IN: &str = r#"
[
    {
        "request": {"mbean": "kafka.server:name=BytesInPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"Count": 2, "OneMinuteRate": 2.1, "FiveMinuteRate": 2.2, "FifteenMinuteRate": 2.3, "MeanRate": 2.4},
        "timestamp": 1462174414,
        "status": 200
    }
]
"#;

#[tokio::test]
async fn reachable_metrics_host_survives_a_dead_one() -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let live = listener.local_addr()?.to_string();
    let router = Router::new().route(
        "/jolokia/",
        post(|| async { ([(header::CONTENT_TYPE, "application/json")], BYTES_IN) }),
    );
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    let gone = TcpListener::bind("127.0.0.1:0").await?;
    let dead = gone.local_addr()?.to_string();
    drop(gone);

    let jolokia = JolokiaClient::new(vec![dead, live.clone()], None, Duration::from_secs(1))?;
    let publisher = Arc::new(Collecting::default());
    let cycle = Cycle::new(cluster(true), Some(jolokia), publisher.clone(), query());

    let report = cycle.run().await;

    assert_eq!(report.offset_events, 3);
    assert_eq!(report.jmx_events, 1);
    let events = publisher.events.lock().unwrap();
    assert!(events.iter().any(|x| matches!(
        &x.body,
        EventBody::Jmx { jmx } if jmx.host == live && jmx.meters.contains_key("BytesInPerSec")
    )));
    Ok(())
}
