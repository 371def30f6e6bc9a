//! Cluster-wide rate/latency and resource derivation (spec.md §4.3.1, §4.3.2).

use super::consts::{clamp_latency, clamp_rate, non_neg_delta, safe_divide, MIN_INTERVAL_SEC, NOT_AVAILABLE};
use crate::model::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterMetrics {
    pub indexing_rate: f64,
    pub search_rate: f64,
    pub index_latency_ms: f64,
    pub search_latency_ms: f64,
}

impl ClusterMetrics {
    pub const NOT_AVAILABLE: Self = Self {
        indexing_rate: NOT_AVAILABLE,
        search_rate: NOT_AVAILABLE,
        index_latency_ms: NOT_AVAILABLE,
        search_latency_ms: NOT_AVAILABLE,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClusterResources {
    pub avg_cpu_pct: f64,
    pub avg_heap_pct: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub used_pct: f64,
    pub total_heap_max_bytes: u64,
}

/// Prefers `primaries.indexing`, falling back to `total.indexing`; prefers
/// `total.search`, falling back to `primaries.search` — the "primaries vs
/// total" asymmetry documented in the glossary (indexing is only counted on
/// primaries; search, on every shard copy that served a query).
fn indexing_counters(scope: &crate::model::CounterScope) -> Option<(u64, u64)> {
    scope
        .indexing
        .map(|c| (c.index_total, c.index_time_in_millis))
}

fn search_counters(scope: &crate::model::CounterScope) -> Option<(u64, u64)> {
    scope.search.map(|c| (c.query_total, c.query_time_in_millis))
}

fn resolve_indexing(entry: &crate::model::IndexStatsEntry) -> Option<(u64, u64)> {
    indexing_counters(&entry.primaries).or_else(|| indexing_counters(&entry.total))
}

fn resolve_search(entry: &crate::model::IndexStatsEntry) -> Option<(u64, u64)> {
    search_counters(&entry.total).or_else(|| search_counters(&entry.primaries))
}

/// Computes cluster-wide indexing/search rate and latency from the two most
/// recent snapshots. Accumulates across indices present in both snapshots;
/// an index appearing only in `curr` is skipped entirely to avoid a spurious
/// spike on index creation (spec.md §4.3.1).
pub fn calc_cluster_metrics(
    prev: Option<&Snapshot>,
    curr: Option<&Snapshot>,
    elapsed_secs: f64,
) -> ClusterMetrics {
    let (Some(prev), Some(curr)) = (prev, curr) else {
        return ClusterMetrics::NOT_AVAILABLE;
    };
    if elapsed_secs < MIN_INTERVAL_SEC {
        return ClusterMetrics::NOT_AVAILABLE;
    }

    let mut index_ops_delta = 0u64;
    let mut index_time_delta = 0u64;
    let mut search_ops_delta = 0u64;
    let mut search_time_delta = 0u64;

    for (name, curr_entry) in &curr.index_stats {
        let Some(prev_entry) = prev.index_stats.get(name) else {
            continue;
        };

        if let (Some((curr_ops, curr_time)), Some((prev_ops, prev_time))) =
            (resolve_indexing(curr_entry), resolve_indexing(prev_entry))
        {
            index_ops_delta += non_neg_delta(curr_ops, prev_ops);
            index_time_delta += non_neg_delta(curr_time, prev_time);
        }

        if let (Some((curr_ops, curr_time)), Some((prev_ops, prev_time))) =
            (resolve_search(curr_entry), resolve_search(prev_entry))
        {
            search_ops_delta += non_neg_delta(curr_ops, prev_ops);
            search_time_delta += non_neg_delta(curr_time, prev_time);
        }
    }

    ClusterMetrics {
        indexing_rate: clamp_rate(index_ops_delta as f64 / elapsed_secs),
        search_rate: clamp_rate(search_ops_delta as f64 / elapsed_secs),
        index_latency_ms: clamp_latency(safe_divide(index_time_delta as f64, index_ops_delta as f64)),
        search_latency_ms: clamp_latency(safe_divide(search_time_delta as f64, search_ops_delta as f64)),
    }
}

/// Computes cluster-wide resource averages from the current snapshot only
/// (no delta needed — these are gauges, not counters) (spec.md §4.3.2).
pub fn calc_cluster_resources(curr: Option<&Snapshot>) -> ClusterResources {
    let Some(curr) = curr else {
        return ClusterResources::default();
    };

    let mut cpu_sum = 0.0;
    let mut cpu_count = 0u32;
    let mut heap_pct_sum = 0.0;
    let mut heap_pct_count = 0u32;
    let mut used_bytes = 0u64;
    let mut total_bytes = 0u64;
    let mut total_heap_max_bytes = 0u64;

    for node in curr.node_stats.values() {
        if let Some(cpu) = node.cpu_percent {
            if cpu > 0.0 {
                cpu_sum += cpu;
                cpu_count += 1;
            }
        }
        if let (Some(used), Some(max)) = (node.heap_used_bytes, node.heap_max_bytes) {
            if max > 0 {
                heap_pct_sum += used as f64 / max as f64 * 100.0;
                heap_pct_count += 1;
                total_heap_max_bytes += max;
            }
        }
        if let (Some(total), Some(available)) = (node.fs_total_bytes, node.fs_available_bytes) {
            total_bytes += total;
            used_bytes += total.saturating_sub(available);
        }
    }

    ClusterResources {
        avg_cpu_pct: safe_divide(cpu_sum, cpu_count as f64),
        avg_heap_pct: safe_divide(heap_pct_sum, heap_pct_count as f64),
        used_bytes,
        total_bytes,
        used_pct: safe_divide(used_bytes as f64, total_bytes as f64) * 100.0,
        total_heap_max_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn bare_snapshot(index_stats: HashMap<String, IndexStatsEntry>) -> Snapshot {
        Snapshot {
            captured_at: Utc::now(),
            health: ClusterHealth {
                cluster_name: "test".into(),
                status: HealthStatus::Green,
                node_count: 1,
                active_shards: 1,
                unassigned_shards: 0,
                pending_tasks: 0,
            },
            nodes: vec![],
            node_stats: HashMap::new(),
            indices: vec![],
            index_stats,
            allocation: vec![],
        }
    }

    fn entry(total_index: u64, total_index_time: u64, total_search: u64, total_search_time: u64) -> IndexStatsEntry {
        IndexStatsEntry {
            primaries: CounterScope {
                indexing: Some(IndexingCounters {
                    index_total: total_index,
                    index_time_in_millis: total_index_time,
                }),
                search: Some(SearchCounters {
                    query_total: total_search,
                    query_time_in_millis: total_search_time,
                }),
                store: None,
            },
            total: CounterScope {
                indexing: Some(IndexingCounters {
                    index_total: total_index,
                    index_time_in_millis: total_index_time,
                }),
                search: Some(SearchCounters {
                    query_total: total_search,
                    query_time_in_millis: total_search_time,
                }),
                store: None,
            },
        }
    }

    // Scenario A: first poll, prev=None.
    #[test]
    fn scenario_a_first_poll_is_not_available() {
        let mut m = HashMap::new();
        m.insert("i".to_string(), entry(1000, 500, 0, 0));
        let curr = bare_snapshot(m);
        let metrics = calc_cluster_metrics(None, Some(&curr), 10.0);
        assert_eq!(metrics, ClusterMetrics::NOT_AVAILABLE);
    }

    // Scenario B: normal deltas.
    #[test]
    fn scenario_b_normal_deltas() {
        let mut pm = HashMap::new();
        pm.insert("i".to_string(), entry(1000, 500, 2000, 800));
        let prev = bare_snapshot(pm);

        let mut cm = HashMap::new();
        cm.insert("i".to_string(), entry(2000, 700, 3500, 1300));
        let curr = bare_snapshot(cm);

        let metrics = calc_cluster_metrics(Some(&prev), Some(&curr), 10.0);
        assert_eq!(metrics.indexing_rate, 100.0);
        assert_eq!(metrics.search_rate, 150.0);
        assert_eq!(metrics.index_latency_ms, 200.0 / 1000.0);
        assert_eq!(metrics.search_latency_ms, 500.0 / 1500.0);
    }

    // Scenario C: counter reset.
    #[test]
    fn scenario_c_counter_reset_yields_zero() {
        let mut pm = HashMap::new();
        pm.insert("i".to_string(), entry(5000, 2000, 5000, 2000));
        let prev = bare_snapshot(pm);

        let mut cm = HashMap::new();
        cm.insert("i".to_string(), entry(100, 50, 100, 50));
        let curr = bare_snapshot(cm);

        let metrics = calc_cluster_metrics(Some(&prev), Some(&curr), 10.0);
        assert_eq!(metrics.indexing_rate, 0.0);
        assert_eq!(metrics.search_rate, 0.0);
        assert_eq!(metrics.index_latency_ms, 0.0);
        assert_eq!(metrics.search_latency_ms, 0.0);
    }

    #[test]
    fn interval_too_short_is_not_available() {
        let mut pm = HashMap::new();
        pm.insert("i".to_string(), entry(1000, 500, 0, 0));
        let prev = bare_snapshot(pm);
        let mut cm = HashMap::new();
        cm.insert("i".to_string(), entry(2000, 700, 0, 0));
        let curr = bare_snapshot(cm);

        let metrics = calc_cluster_metrics(Some(&prev), Some(&curr), 0.5);
        assert_eq!(metrics, ClusterMetrics::NOT_AVAILABLE);
    }

    #[test]
    fn index_only_in_curr_is_skipped() {
        let prev = bare_snapshot(HashMap::new());
        let mut cm = HashMap::new();
        cm.insert("new-index".to_string(), entry(2000, 700, 0, 0));
        let curr = bare_snapshot(cm);

        let metrics = calc_cluster_metrics(Some(&prev), Some(&curr), 10.0);
        assert_eq!(metrics.indexing_rate, 0.0);
    }

    #[test]
    fn resources_skip_zero_reporting_nodes() {
        let mut ns = HashMap::new();
        ns.insert(
            "n1".to_string(),
            NodeStatsEntry {
                node_id: "n1".into(),
                name: "n1".into(),
                cpu_percent: Some(0.0),
                heap_used_bytes: Some(50),
                heap_max_bytes: Some(100),
                fs_total_bytes: Some(1000),
                fs_available_bytes: Some(400),
                primaries: CounterScope::default(),
                total: CounterScope::default(),
            },
        );
        ns.insert(
            "n2".to_string(),
            NodeStatsEntry {
                node_id: "n2".into(),
                name: "n2".into(),
                cpu_percent: Some(40.0),
                heap_used_bytes: Some(80),
                heap_max_bytes: Some(100),
                fs_total_bytes: Some(1000),
                fs_available_bytes: Some(600),
                primaries: CounterScope::default(),
                total: CounterScope::default(),
            },
        );
        let mut snap = bare_snapshot(HashMap::new());
        snap.node_stats = ns;

        let res = calc_cluster_resources(Some(&snap));
        assert_eq!(res.avg_cpu_pct, 40.0); // n1's 0 is excluded
        assert_eq!(res.avg_heap_pct, 65.0); // (50 + 80) averaged
        assert_eq!(res.used_bytes, 600 + 400);
        assert_eq!(res.total_bytes, 2000);
        assert_eq!(res.total_heap_max_bytes, 200);
    }
}
