use serde::{Deserialize, Serialize};
use std::fmt;

const READ: &str = "READ";

/// JMX proxy the bridge forwards reads through. An empty `url` disables it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyTarget {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl ProxyTarget {
    pub fn new(host: &str, proxy: &ProxyConfig) -> Self {
        Self {
            url: format!("service:jmx:rmi:///jndi/rmi://{}/jmxrmi", host),
            user: proxy.user.clone(),
            password: proxy.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadRequest {
    #[serde(rename = "type")]
    pub request_type: &'static str,
    pub mbean: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ProxyTarget>,
}

impl ReadRequest {
    pub fn new(mbean: &str, target: Option<ProxyTarget>) -> Self {
        Self {
            request_type: READ,
            mbean: mbean.to_owned(),
            target,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadResponse {
    #[serde(default)]
    pub status: u32,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub request: Option<RequestEcho>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEcho {
    pub mbean: Option<String>,
}

/// Attributes of a Yammer meter as exposed over JMX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MeterMetric {
    pub count: i64,
    pub fifteen_minute_rate: f64,
    pub five_minute_rate: f64,
    pub one_minute_rate: f64,
    pub mean_rate: f64,
}
