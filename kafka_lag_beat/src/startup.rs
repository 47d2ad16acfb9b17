use crate::app_config::AppConfig;
use crate::cycle::Cycle;
use crate::publisher::JsonLinesPublisher;
use anyhow::Context;
use jolokia_client::JolokiaClient;
use kafka_lag::cluster::BrokerPool;
use kafka_lag::queries::topic_lags::GetTopicLagsQuery;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub cycles: u64,
    pub overruns: u64,
}

pub async fn run_until_stopped(config: AppConfig) -> Result<(), anyhow::Error> {
    let pool = Arc::new(
        BrokerPool::create(config.connection_settings()).context("While creating broker pool")?,
    );

    let jolokia = config
        .jolokia
        .as_ref()
        .map(|x| JolokiaClient::new(x.hosts.clone(), x.proxy.clone(), x.timeout()))
        .transpose()
        .context("While creating jolokia client")?;

    let query = GetTopicLagsQuery {
        group: config.consumer_group.clone(),
        topics: config.topics.clone(),
    };
    let cycle = Cycle::new(
        pool.clone(),
        jolokia,
        Arc::new(JsonLinesPublisher::stdout()),
        query,
    );

    let cancellation_token = CancellationToken::new();
    let token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, stopping after the current cycle"),
            Err(e) => error!("Error while listening for Ctrl-C: {:?}", e),
        }
        token.cancel();
    });

    info!("kafka_lag_beat is running! Hit CTRL-C to stop it.");

    let summary = run_schedule(config.period(), cancellation_token, || cycle.run()).await;

    info!(
        "Stopped after {} cycle(s), {} overrun(s)",
        summary.cycles, summary.overruns
    );
    pool.close().await;

    Ok(())
}

/// Runs `run_cycle` once per `period` until `cancellation_token` is cancelled.
///
/// Cycles never overlap. Ticks missed while a cycle was running are dropped,
/// an in-flight cycle is always finished.
pub async fn run_schedule<F, Fut>(
    period: Duration,
    cancellation_token: CancellationToken,
    mut run_cycle: F,
) -> ScheduleSummary
where
    F: FnMut() -> Fut,
    Fut: Future,
{
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut summary = ScheduleSummary::default();
    loop {
        select! {
            biased;
            _ = cancellation_token.cancelled() => {
                info!("Schedule was cancelled");
                break
            }
            _ = interval.tick() => {}
        }

        let started = Instant::now();
        let span = info_span!("cycle", id = %Uuid::now_v7());
        run_cycle().instrument(span).await;
        summary.cycles += 1;

        if started.elapsed() > period {
            summary.overruns += 1;
            warn!("Ignoring tick(s) due to processing taking longer than one period");
        }
    }

    summary
}
