use reqwest::StatusCode;

/// Failure to read the meters of one host. Never fatal to a cycle.
#[derive(Debug, thiserror::Error)]
pub enum MetricsFetchError {
    #[error("Request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Response from {url} is not a list of read results")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
