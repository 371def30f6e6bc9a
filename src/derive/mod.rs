//! The derivation engine: pure functions consuming one or two [`Snapshot`]s
//! and emitting display rows and cluster aggregates (spec.md §4.3).

pub mod cluster;
pub mod consts;
pub mod indices;
pub mod nodes;
pub mod recommendations;

pub use cluster::{calc_cluster_metrics, calc_cluster_resources, ClusterMetrics, ClusterResources};
pub use indices::{calc_index_rows, IndexRow};
pub use nodes::{calc_node_rows, NodeRow};
pub use recommendations::{calc_recommendations, Category, Recommendation, Severity};

use crate::model::Snapshot;

/// Everything the dashboard needs to render one frame, derived from a pair
/// of snapshots.
#[derive(Debug, Clone)]
pub struct DerivedFrame {
    pub metrics: ClusterMetrics,
    pub resources: ClusterResources,
    pub node_rows: Vec<NodeRow>,
    pub index_rows: Vec<IndexRow>,
    pub recommendations: Vec<Recommendation>,
}

/// Runs the full derivation pipeline for one (prev, curr) pair.
pub fn derive(prev: Option<&Snapshot>, curr: Option<&Snapshot>) -> Option<DerivedFrame> {
    let curr_snap = curr?;
    let elapsed_secs = prev
        .map(|p| {
            (curr_snap.captured_at - p.captured_at)
                .num_milliseconds()
                .max(0) as f64
                / 1000.0
        })
        .unwrap_or(0.0);

    let metrics = calc_cluster_metrics(prev, curr, elapsed_secs);
    let resources = calc_cluster_resources(curr);
    let node_rows = calc_node_rows(prev, curr, elapsed_secs);
    let index_rows = calc_index_rows(prev, curr, elapsed_secs);
    let recommendations = calc_recommendations(curr_snap, &resources, &node_rows, &index_rows);

    Some(DerivedFrame {
        metrics,
        resources,
        node_rows,
        index_rows,
        recommendations,
    })
}
