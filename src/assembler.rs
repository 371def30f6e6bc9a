//! Snapshot Assembler (spec.md §4.2): gathers one coherent [`Snapshot`] from
//! the gateway's six reads under a single deadline, cancelling siblings the
//! moment any of the five core fetches fails. Allocation is launched
//! concurrently with that group, under the outer deadline, and its failure
//! is swallowed — a cluster mid-rebalance can return a transient
//! `/_cat/allocation` error without blanking the whole dashboard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::gateway::error::GatewayError;
use crate::gateway::EsGateway;
use crate::model::{ClusterHealth, IndexInfo, IndexStatsEntry, NodeInfo, NodeStatsEntry, Snapshot};

#[derive(Debug, Error, Clone)]
pub enum AssembleError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("incomplete response: {0}")]
    Incomplete(&'static str),

    #[error("snapshot assembly timed out after {0:?}")]
    DeadlineExceeded(Duration),
}

/// One of the five core fetches the assembler races under a shared deadline.
enum CoreFetch {
    Health(Result<ClusterHealth, GatewayError>),
    Nodes(Result<Vec<NodeInfo>, GatewayError>),
    NodeStats(Result<HashMap<String, NodeStatsEntry>, GatewayError>),
    Indices(Result<Vec<IndexInfo>, GatewayError>),
    IndexStats(Result<HashMap<String, IndexStatsEntry>, GatewayError>),
}

/// Deadline applied to the whole core-fetch group (spec.md §4.2).
pub const ASSEMBLE_DEADLINE: Duration = Duration::from_secs(15);

/// Fetches cluster health, nodes, node stats, indices, and index stats
/// concurrently; the first failure aborts the remaining in-flight fetches
/// and is returned immediately. Allocation is spawned up front so it
/// overlaps with the core group instead of trailing behind it, and is
/// joined against whatever's left of `ASSEMBLE_DEADLINE` once the core
/// fetches land — its failure (or a timeout) defaults to empty.
pub async fn assemble(gateway: Arc<dyn EsGateway>) -> Result<Snapshot, AssembleError> {
    let started = tokio::time::Instant::now();
    let alloc_handle = {
        let g = gateway.clone();
        tokio::spawn(async move { g.get_allocation().await })
    };

    let (health, nodes, node_stats, indices, index_stats) =
        match tokio::time::timeout(ASSEMBLE_DEADLINE, run_core_fetches(gateway.clone())).await {
            Ok(Ok(tuple)) => tuple,
            Ok(Err(e)) => {
                alloc_handle.abort();
                return Err(e);
            }
            Err(_) => {
                alloc_handle.abort();
                return Err(AssembleError::DeadlineExceeded(ASSEMBLE_DEADLINE));
            }
        };

    let remaining = ASSEMBLE_DEADLINE.saturating_sub(started.elapsed());
    let allocation = match tokio::time::timeout(remaining, alloc_handle).await {
        Ok(Ok(Ok(allocation))) => allocation,
        _ => Vec::new(),
    };

    Ok(Snapshot {
        captured_at: Utc::now(),
        health,
        nodes,
        node_stats,
        indices,
        index_stats,
        allocation,
    })
}

#[allow(clippy::type_complexity)]
async fn run_core_fetches(
    gateway: Arc<dyn EsGateway>,
) -> Result<
    (
        ClusterHealth,
        Vec<NodeInfo>,
        HashMap<String, NodeStatsEntry>,
        Vec<IndexInfo>,
        HashMap<String, IndexStatsEntry>,
    ),
    AssembleError,
> {
    let mut set: JoinSet<CoreFetch> = JoinSet::new();

    {
        let g = gateway.clone();
        set.spawn(async move { CoreFetch::Health(g.get_cluster_health().await) });
    }
    {
        let g = gateway.clone();
        set.spawn(async move { CoreFetch::Nodes(g.get_nodes().await) });
    }
    {
        let g = gateway.clone();
        set.spawn(async move { CoreFetch::NodeStats(g.get_node_stats().await) });
    }
    {
        let g = gateway.clone();
        set.spawn(async move { CoreFetch::Indices(g.get_indices().await) });
    }
    {
        let g = gateway.clone();
        set.spawn(async move { CoreFetch::IndexStats(g.get_index_stats().await) });
    }

    let mut health = None;
    let mut nodes = None;
    let mut node_stats = None;
    let mut indices = None;
    let mut index_stats = None;

    while let Some(joined) = set.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_err) => {
                set.abort_all();
                return Err(AssembleError::Gateway(GatewayError::Unreachable(format!(
                    "fetch task panicked: {join_err}"
                ))));
            }
        };

        let failed = match &outcome {
            CoreFetch::Health(r) => r.is_err(),
            CoreFetch::Nodes(r) => r.is_err(),
            CoreFetch::NodeStats(r) => r.is_err(),
            CoreFetch::Indices(r) => r.is_err(),
            CoreFetch::IndexStats(r) => r.is_err(),
        };
        if failed {
            set.abort_all();
        }

        match outcome {
            CoreFetch::Health(r) => health = Some(r?),
            CoreFetch::Nodes(r) => nodes = Some(r?),
            CoreFetch::NodeStats(r) => node_stats = Some(r?),
            CoreFetch::Indices(r) => indices = Some(r?),
            CoreFetch::IndexStats(r) => index_stats = Some(r?),
        }
    }

    let health = health.ok_or(AssembleError::Incomplete("cluster health"))?;
    let node_stats = node_stats.ok_or(AssembleError::Incomplete("node stats"))?;
    let index_stats = index_stats.ok_or(AssembleError::Incomplete("index stats"))?;
    let nodes = nodes.unwrap_or_default();
    let indices = indices.unwrap_or_default();

    Ok((health, nodes, node_stats, indices, index_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::IndexSettingsValues;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGateway {
        fail_indices: bool,
        calls: Arc<AtomicUsize>,
        allocation_fails: bool,
    }

    #[async_trait]
    impl EsGateway for FakeGateway {
        async fn ping(&self) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn get_cluster_health(&self) -> Result<ClusterHealth, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ClusterHealth {
                cluster_name: "test".into(),
                status: crate::model::HealthStatus::Green,
                node_count: 3,
                active_shards: 10,
                unassigned_shards: 0,
                pending_tasks: 0,
            })
        }
        async fn get_nodes(&self) -> Result<Vec<NodeInfo>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
        async fn get_node_stats(&self) -> Result<HashMap<String, NodeStatsEntry>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HashMap::new())
        }
        async fn get_indices(&self) -> Result<Vec<IndexInfo>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_indices {
                Err(GatewayError::Timeout("indices".into()))
            } else {
                Ok(vec![])
            }
        }
        async fn get_index_stats(&self) -> Result<HashMap<String, IndexStatsEntry>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HashMap::new())
        }
        async fn get_allocation(&self) -> Result<Vec<crate::model::AllocationEntry>, GatewayError> {
            if self.allocation_fails {
                Err(GatewayError::Timeout("allocation".into()))
            } else {
                Ok(vec![])
            }
        }
        async fn delete_index(&self, _names: &[String]) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn get_index_settings(&self, _name: &str) -> Result<IndexSettingsValues, GatewayError> {
            Ok(IndexSettingsValues::default())
        }
        async fn update_index_settings(
            &self,
            _names: &[String],
            _flat: &HashMap<String, Option<String>>,
        ) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn assembles_a_full_snapshot_on_success() {
        let gw: Arc<dyn EsGateway> = Arc::new(FakeGateway {
            fail_indices: false,
            calls: Arc::new(AtomicUsize::new(0)),
            allocation_fails: false,
        });
        let snap = assemble(gw).await.expect("assembly succeeds");
        assert_eq!(snap.health.cluster_name, "test");
    }

    #[tokio::test]
    async fn one_failing_core_fetch_fails_the_whole_assembly() {
        let gw: Arc<dyn EsGateway> = Arc::new(FakeGateway {
            fail_indices: true,
            calls: Arc::new(AtomicUsize::new(0)),
            allocation_fails: false,
        });
        let result = assemble(gw).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn allocation_failure_is_swallowed() {
        let gw: Arc<dyn EsGateway> = Arc::new(FakeGateway {
            fail_indices: false,
            calls: Arc::new(AtomicUsize::new(0)),
            allocation_fails: true,
        });
        let snap = assemble(gw).await.expect("assembly still succeeds");
        assert!(snap.allocation.is_empty());
    }
}
