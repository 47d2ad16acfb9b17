use anyhow::{bail, Context};
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use kafka_protocol::messages::{ApiKey, BrokerId, RequestHeader, ResponseHeader};
use kafka_protocol::protocol::{Decodable, Encodable, StrBytes};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::debug;

const MAX_FRAME_LENGTH: usize = 100 * 1024 * 1024;

/// A single plaintext connection to one broker.
///
/// Kafka frames are a 4-byte big-endian length followed by the payload, which
/// is what `LengthDelimitedCodec` does by default. Requests on one connection
/// are serialized; the broker answers them in order.
pub struct BrokerConnection {
    broker_id: BrokerId,
    address: String,
    client_id: StrBytes,
    correlation_id: AtomicI32,
    framed: Mutex<Framed<TcpStream, LengthDelimitedCodec>>,
}

impl BrokerConnection {
    pub async fn connect(
        broker_id: BrokerId,
        address: &str,
        client_id: &str,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .with_context(|| format!("Timed out connecting to broker {} at {}", broker_id.0, address))?
            .with_context(|| format!("While connecting to broker {} at {}", broker_id.0, address))?;
        stream.set_nodelay(true)?;

        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LENGTH)
            .new_codec();

        debug!("Connected to broker {} at {}", broker_id.0, address);

        Ok(Self {
            broker_id,
            address: address.to_owned(),
            client_id: StrBytes::from_string(client_id.to_owned()),
            correlation_id: AtomicI32::new(0),
            framed: Mutex::new(Framed::new(stream, codec)),
        })
    }

    pub fn broker_id(&self) -> BrokerId {
        self.broker_id
    }

    pub async fn send<Req, Resp>(
        &self,
        api_key: ApiKey,
        version: i16,
        request: &Req,
    ) -> Result<Resp, anyhow::Error>
    where
        Req: Encodable,
        Resp: Decodable,
    {
        let correlation_id = self.correlation_id.fetch_add(1, Ordering::Relaxed);
        let frame = encode_request(api_key, version, correlation_id, &self.client_id, request)
            .with_context(|| format!("While encoding {:?} request", api_key))?;

        let mut framed = self.framed.lock().await;
        framed
            .send(frame)
            .await
            .with_context(|| format!("While sending {:?} to {}", api_key, self.address))?;

        let response = framed
            .next()
            .await
            .with_context(|| format!("Broker {} closed the connection", self.address))?
            .with_context(|| format!("While reading {:?} response from {}", api_key, self.address))?;
        drop(framed);

        decode_response(api_key, version, correlation_id, response)
    }
}

pub fn encode_request<Req: Encodable>(
    api_key: ApiKey,
    version: i16,
    correlation_id: i32,
    client_id: &StrBytes,
    request: &Req,
) -> Result<Bytes, anyhow::Error> {
    let header = RequestHeader::default()
        .with_request_api_key(api_key as i16)
        .with_request_api_version(version)
        .with_correlation_id(correlation_id)
        .with_client_id(Some(client_id.clone()));

    let mut buf = BytesMut::new();
    header.encode(&mut buf, api_key.request_header_version(version))?;
    request.encode(&mut buf, version)?;

    Ok(buf.freeze())
}

pub fn decode_response<Resp: Decodable>(
    api_key: ApiKey,
    version: i16,
    correlation_id: i32,
    frame: BytesMut,
) -> Result<Resp, anyhow::Error> {
    let mut buf = frame.freeze();
    let header = ResponseHeader::decode(&mut buf, api_key.response_header_version(version))
        .context("While decoding response header")?;

    if header.correlation_id != correlation_id {
        bail!(
            "Correlation id mismatch: sent {}, received {}",
            correlation_id,
            header.correlation_id
        )
    }

    let response = Resp::decode(&mut buf, version)
        .with_context(|| format!("While decoding {:?} response v{}", api_key, version))?;

    Ok(response)
}
