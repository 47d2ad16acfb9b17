pub mod client;
pub mod error;
pub mod mbean;
pub mod payload;

pub use client::{HostMetrics, JolokiaClient};
pub use error::MetricsFetchError;
pub use payload::{MeterMetric, ProxyConfig};
