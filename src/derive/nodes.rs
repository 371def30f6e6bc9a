//! Per-node row derivation (spec.md §4.3.3).

use super::consts::{clamp_latency, clamp_rate, non_neg_delta, safe_divide, MIN_INTERVAL_SEC, NOT_AVAILABLE};
use crate::model::Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: String,
    pub name: String,
    pub role: String,
    pub ip: String,
    pub indexing_rate: f64,
    pub search_rate: f64,
    pub index_latency_ms: f64,
    pub search_latency_ms: f64,
    pub heap_used_bytes: u64,
    pub heap_max_bytes: u64,
    pub shard_count: i64,
    pub disk_percent: f64,
}

fn counter_pair(
    curr: &crate::model::NodeStatsEntry,
    prev: &crate::model::NodeStatsEntry,
) -> Option<(u64, u64, u64, u64)> {
    let curr_idx = curr.primaries.indexing.or(curr.total.indexing)?;
    let prev_idx = prev.primaries.indexing.or(prev.total.indexing)?;
    let curr_srch = curr.total.search.or(curr.primaries.search)?;
    let prev_srch = prev.total.search.or(prev.primaries.search)?;
    Some((
        non_neg_delta(curr_idx.index_total, prev_idx.index_total),
        non_neg_delta(curr_idx.index_time_in_millis, prev_idx.index_time_in_millis),
        non_neg_delta(curr_srch.query_total, prev_srch.query_total),
        non_neg_delta(curr_srch.query_time_in_millis, prev_srch.query_time_in_millis),
    ))
}

/// Builds one [`NodeRow`] per entry in `curr.node_stats`, sorted by name.
pub fn calc_node_rows(prev: Option<&Snapshot>, curr: Option<&Snapshot>, elapsed_secs: f64) -> Vec<NodeRow> {
    let Some(curr) = curr else {
        return Vec::new();
    };

    let mut rows: Vec<NodeRow> = curr
        .node_stats
        .iter()
        .map(|(node_id, stats)| {
            let info = curr.node_info_by_name(&stats.name);
            let alloc = curr.allocation_for_node(&stats.name);

            let (indexing_rate, search_rate, index_latency_ms, search_latency_ms) =
                match (prev, elapsed_secs >= MIN_INTERVAL_SEC) {
                    (Some(prev), true) => match prev.node_stats.get(node_id).and_then(|p| counter_pair(stats, p)) {
                        Some((idx_ops, idx_time, srch_ops, srch_time)) => (
                            clamp_rate(idx_ops as f64 / elapsed_secs),
                            clamp_rate(srch_ops as f64 / elapsed_secs),
                            clamp_latency(safe_divide(idx_time as f64, idx_ops as f64)),
                            clamp_latency(safe_divide(srch_time as f64, srch_ops as f64)),
                        ),
                        None => (NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE),
                    },
                    _ => (NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE),
                };

            NodeRow {
                id: node_id.clone(),
                name: stats.name.clone(),
                role: info.map(|i| i.role.clone()).unwrap_or_default(),
                ip: info.map(|i| i.ip.clone()).unwrap_or_default(),
                indexing_rate,
                search_rate,
                index_latency_ms,
                search_latency_ms,
                heap_used_bytes: stats.heap_used_bytes.unwrap_or(0),
                heap_max_bytes: stats.heap_max_bytes.unwrap_or(0),
                shard_count: alloc.map(|a| a.shards as i64).unwrap_or(-1),
                disk_percent: alloc
                    .and_then(|a| a.disk_percent.parse::<f64>().ok())
                    .unwrap_or(-1.0),
            }
        })
        .collect();

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn snapshot_with(node_stats: HashMap<String, NodeStatsEntry>, nodes: Vec<NodeInfo>) -> Snapshot {
        Snapshot {
            captured_at: Utc::now(),
            health: ClusterHealth {
                cluster_name: "c".into(),
                status: HealthStatus::Green,
                node_count: nodes.len() as u32,
                active_shards: 0,
                unassigned_shards: 0,
                pending_tasks: 0,
            },
            nodes,
            node_stats,
            indices: vec![],
            index_stats: HashMap::new(),
            allocation: vec![],
        }
    }

    fn stats_entry(name: &str, idx_total: u64, idx_time: u64) -> NodeStatsEntry {
        NodeStatsEntry {
            node_id: format!("id-{name}"),
            name: name.to_string(),
            cpu_percent: Some(10.0),
            heap_used_bytes: Some(100),
            heap_max_bytes: Some(200),
            fs_total_bytes: Some(1000),
            fs_available_bytes: Some(500),
            primaries: CounterScope {
                indexing: Some(IndexingCounters {
                    index_total: idx_total,
                    index_time_in_millis: idx_time,
                }),
                search: Some(SearchCounters::default()),
                store: None,
            },
            total: CounterScope::default(),
        }
    }

    #[test]
    fn node_absent_from_prev_is_not_available() {
        let mut curr_stats = HashMap::new();
        curr_stats.insert("id-n1".to_string(), stats_entry("n1", 100, 50));
        let curr = snapshot_with(curr_stats, vec![]);

        let prev = snapshot_with(HashMap::new(), vec![]);

        let rows = calc_node_rows(Some(&prev), Some(&curr), 10.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].indexing_rate, NOT_AVAILABLE);
        assert_eq!(rows[0].search_latency_ms, NOT_AVAILABLE);
    }

    #[test]
    fn rows_sorted_by_name() {
        let mut curr_stats = HashMap::new();
        curr_stats.insert("id-zeta".to_string(), stats_entry("zeta", 0, 0));
        curr_stats.insert("id-alpha".to_string(), stats_entry("alpha", 0, 0));
        let curr = snapshot_with(curr_stats, vec![]);

        let rows = calc_node_rows(None, Some(&curr), 10.0);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "zeta");
    }

    #[test]
    fn missing_allocation_defaults_to_negative_one() {
        let mut curr_stats = HashMap::new();
        curr_stats.insert("id-n1".to_string(), stats_entry("n1", 0, 0));
        let curr = snapshot_with(curr_stats, vec![]);
        let rows = calc_node_rows(None, Some(&curr), 10.0);
        assert_eq!(rows[0].shard_count, -1);
        assert_eq!(rows[0].disk_percent, -1.0);
    }
}
