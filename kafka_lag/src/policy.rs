use std::fmt::Display;
use tracing::warn;

/// What a failed request does to the rest of the cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    AbortCycle,
    SkipAndContinue,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchPath {
    /// Committed and latest offsets. A partial lag set would be misleading.
    ConsumerLag,
    /// Jolokia meters, supplementary telemetry.
    BrokerMetrics,
}

impl FetchPath {
    pub fn policy(self) -> FailurePolicy {
        match self {
            FetchPath::ConsumerLag => FailurePolicy::AbortCycle,
            FetchPath::BrokerMetrics => FailurePolicy::SkipAndContinue,
        }
    }
}

/// Collects the outcome of independent requests according to `policy`.
pub fn settle<T, E, I>(policy: FailurePolicy, results: I) -> Result<Vec<T>, E>
where
    E: Display,
    I: IntoIterator<Item = Result<T, E>>,
{
    let mut values = vec![];
    for result in results {
        match (result, policy) {
            (Ok(value), _) => values.push(value),
            (Err(e), FailurePolicy::AbortCycle) => return Err(e),
            (Err(e), FailurePolicy::SkipAndContinue) => {
                warn!("Skipping failed request: {e:#}");
            }
        }
    }

    Ok(values)
}
