use crate::cluster::ClusterClient;
use crate::error::LagError;
use kafka_protocol::messages::BrokerId;
use tracing::debug;

/// Broker currently holding the committed offsets of `group`.
///
/// Never cached by the caller, coordinators move on broker restarts.
pub async fn resolve_group_coordinator<C>(client: &C, group: &str) -> Result<BrokerId, LagError>
where
    C: ClusterClient + ?Sized,
{
    let coordinator = client
        .coordinator(group)
        .await
        .map_err(|source| LagError::Coordinator {
            group: group.to_owned(),
            source,
        })?;

    debug!("Group {} is coordinated by broker {}", group, coordinator.0);
    Ok(coordinator)
}
