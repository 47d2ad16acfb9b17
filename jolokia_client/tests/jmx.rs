extern crate jolokia_client;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use jolokia_client::{JolokiaClient, MeterMetric, MetricsFetchError, ProxyConfig};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const READ_RESULTS: &str = r#"
[
    {
        "request": {"mbean": "kafka.server:name=MessagesInPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "messages", "Count": 1, "OneMinuteRate": 1.1, "FiveMinuteRate": 1.2, "FifteenMinuteRate": 1.3, "MeanRate": 1.4},
        "timestamp": 1462174414,
        "status": 200
    },
    {
        "request": {"mbean": "kafka.server:name=BytesInPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "bytes", "Count": 2, "OneMinuteRate": 2.1, "FiveMinuteRate": 2.2, "FifteenMinuteRate": 2.3, "MeanRate": 2.4},
        "timestamp": 1462174414,
        "status": 200
    },
    {
        "request": {"mbean": "kafka.server:name=BytesOutPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "bytes", "Count": 3, "OneMinuteRate": 3.1, "FiveMinuteRate": 3.2, "FifteenMinuteRate": 3.3, "MeanRate": 3.4},
        "timestamp": 1462174414,
        "status": 200
    },
    {
        "request": {"mbean": "kafka.server:name=BytesRejectedPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "bytes", "Count": 4, "OneMinuteRate": 4.1, "FiveMinuteRate": 4.2, "FifteenMinuteRate": 4.3, "MeanRate": 4.4},
        "timestamp": 1462174414,
        "status": 200
    },
    {
        "request": {"mbean": "kafka.server:name=FailedProduceRequestsPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "requests", "Count": 5, "OneMinuteRate": 5.1, "FiveMinuteRate": 5.2, "FifteenMinuteRate": 5.3, "MeanRate": 5.4},
        "timestamp": 1462174414,
        "status": 200
    },
    {
        "request": {"mbean": "kafka.server:name=FailedFetchRequestsPerSec,type=BrokerTopicMetrics", "type": "read"},
        "value": {"RateUnit": "SECONDS", "EventType": "requests", "Count": 6, "OneMinuteRate": 6.1, "FiveMinuteRate": 6.2, "FifteenMinuteRate": 6.3, "MeanRate": 6.4},
        "timestamp": 1462174414,
        "status": 200
    }
]
"#;

type SeenBodies = Arc<Mutex<Vec<Value>>>;

async fn read(State(seen): State<SeenBodies>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().push(body);
    ([(header::CONTENT_TYPE, "application/json")], READ_RESULTS)
}

async fn spawn_agent(router: Router) -> Result<String, anyhow::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    Ok(address)
}

fn client(hosts: Vec<String>, proxy: Option<ProxyConfig>) -> JolokiaClient {
    JolokiaClient::new(hosts, proxy, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn every_meter_is_keyed_by_short_name() -> Result<(), anyhow::Error> {
    let seen = SeenBodies::default();
    let address = spawn_agent(
        Router::new()
            .route("/jolokia/", post(read))
            .with_state(seen.clone()),
    )
    .await?;
    let client = client(vec![address.clone()], None);

    let metrics = client.fetch_host(&address).await?;

    assert_eq!(metrics.host(), &address);
    assert_eq!(metrics.meters().len(), 6);
    let expected = [
        ("MessagesInPerSec", 1, [1.1, 1.2, 1.3, 1.4]),
        ("BytesInPerSec", 2, [2.1, 2.2, 2.3, 2.4]),
        ("BytesOutPerSec", 3, [3.1, 3.2, 3.3, 3.4]),
        ("BytesRejectedPerSec", 4, [4.1, 4.2, 4.3, 4.4]),
        ("FailedProduceRequestsPerSec", 5, [5.1, 5.2, 5.3, 5.4]),
        ("FailedFetchRequestsPerSec", 6, [6.1, 6.2, 6.3, 6.4]),
    ];
    for (name, count, [one, five, fifteen, mean]) in expected {
        assert_eq!(
            metrics.meters()[name],
            MeterMetric {
                count,
                one_minute_rate: one,
                five_minute_rate: five,
                fifteen_minute_rate: fifteen,
                mean_rate: mean,
            }
        );
    }

    let bodies = seen.lock().unwrap();
    let requests = bodies[0].as_array().unwrap();
    assert_eq!(requests.len(), 6);
    assert!(requests.iter().all(|x| x["type"] == "READ"));
    assert!(requests.iter().all(|x| x.get("target").is_none()));
    Ok(())
}

#[tokio::test]
async fn proxy_receives_reads_targeting_the_host() -> Result<(), anyhow::Error> {
    let seen = SeenBodies::default();
    let proxy_address = spawn_agent(
        Router::new()
            .route("/jolokia/", post(read))
            .with_state(seen.clone()),
    )
    .await?;
    let proxy = ProxyConfig {
        url: format!("//{}", proxy_address),
        user: "jmx".to_owned(),
        password: "secret".to_owned(),
    };
    let client = client(vec!["broker-1:9999".to_owned()], Some(proxy));

    let metrics = client.fetch_host("broker-1:9999").await?;

    assert_eq!(metrics.host(), "broker-1:9999");
    assert_eq!(metrics.meters().len(), 6);

    let bodies = seen.lock().unwrap();
    let target = &bodies[0][0]["target"];
    assert_eq!(
        target["url"],
        "service:jmx:rmi:///jndi/rmi://broker-1:9999/jmxrmi"
    );
    assert_eq!(target["user"], "jmx");
    assert_eq!(target["password"], "secret");
    Ok(())
}

#[tokio::test]
async fn server_error_is_reported_as_status() -> Result<(), anyhow::Error> {
    let address = spawn_agent(Router::new().route(
        "/jolokia/",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await?;

    let result = client(vec![], None).fetch_host(&address).await;

    assert!(matches!(
        result,
        Err(MetricsFetchError::Status { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
    Ok(())
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() -> Result<(), anyhow::Error> {
    let address =
        spawn_agent(Router::new().route("/jolokia/", post(|| async { "<html></html>" }))).await?;

    let result = client(vec![], None).fetch_host(&address).await;

    assert!(matches!(result, Err(MetricsFetchError::Decode { .. })));
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_an_http_error() -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    drop(listener);

    let result = client(vec![], None).fetch_host(&address).await;

    assert!(matches!(result, Err(MetricsFetchError::Http { .. })));
    Ok(())
}
