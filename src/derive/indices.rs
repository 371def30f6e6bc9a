//! Per-index row derivation (spec.md §4.3.4).

use super::consts::{clamp_latency, clamp_rate, non_neg_delta, safe_divide, MIN_INTERVAL_SEC, NOT_AVAILABLE};
use crate::model::{IndexStatsEntry, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRow {
    pub name: String,
    pub primary_shard_count: u32,
    pub total_shard_count: u32,
    pub rep_known: bool,
    pub doc_count_known: bool,
    pub total_size_bytes: u64,
    pub pri_size_bytes: u64,
    pub avg_shard_size_bytes: f64,
    pub doc_count: u64,
    pub indexing_rate: f64,
    pub search_rate: f64,
    pub index_latency_ms: f64,
    pub search_latency_ms: f64,
}

impl IndexRow {
    pub fn is_system(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Parses tolerantly: any non-numeric string (including `"-"`) parses to 0
/// and is flagged unknown, rather than failing the whole row (spec.md
/// §4.3.4).
fn parse_tolerant(s: &str) -> (u64, bool) {
    match s.parse::<u64>() {
        Ok(v) => (v, true),
        Err(_) => (0, false),
    }
}

fn indexing_counters(scope: &crate::model::CounterScope) -> Option<(u64, u64)> {
    scope.indexing.map(|c| (c.index_total, c.index_time_in_millis))
}

fn search_counters(scope: &crate::model::CounterScope) -> Option<(u64, u64)> {
    scope.search.map(|c| (c.query_total, c.query_time_in_millis))
}

fn resolve_indexing(entry: &IndexStatsEntry) -> Option<(u64, u64)> {
    indexing_counters(&entry.primaries).or_else(|| indexing_counters(&entry.total))
}

fn resolve_search(entry: &IndexStatsEntry) -> Option<(u64, u64)> {
    search_counters(&entry.total).or_else(|| search_counters(&entry.primaries))
}

pub fn calc_index_rows(prev: Option<&Snapshot>, curr: Option<&Snapshot>, elapsed_secs: f64) -> Vec<IndexRow> {
    let Some(curr) = curr else {
        return Vec::new();
    };

    curr.indices
        .iter()
        .map(|info| {
            let (pri, _pri_known) = parse_tolerant(&info.pri_shards_str);
            let (rep, rep_known) = parse_tolerant(&info.rep_str);
            let (doc_count, doc_count_known) = parse_tolerant(&info.doc_count_str);
            let pri = pri as u32;
            let rep = rep as u32;
            let total_shard_count = pri * (1 + rep);

            let curr_stats = curr.index_stats.get(&info.name);
            let total_size_bytes = curr_stats.and_then(|s| s.total.store).map(|s| s.size_in_bytes).unwrap_or(0);
            let pri_size_bytes = curr_stats.and_then(|s| s.primaries.store).map(|s| s.size_in_bytes).unwrap_or(0);
            let avg_shard_size_bytes = pri_size_bytes as f64 / (pri.max(1) as f64);

            let prev_has_index = prev
                .and_then(|p| p.index_stats.get(&info.name))
                .is_some();

            let (indexing_rate, search_rate, index_latency_ms, search_latency_ms) = match (
                prev,
                curr_stats,
                elapsed_secs >= MIN_INTERVAL_SEC,
            ) {
                (Some(prev), Some(curr_entry), true) if prev_has_index => {
                    let prev_entry = prev.index_stats.get(&info.name).expect("checked above");
                    let idx = resolve_indexing(curr_entry).zip(resolve_indexing(prev_entry));
                    let srch = resolve_search(curr_entry).zip(resolve_search(prev_entry));
                    match (idx, srch) {
                        (Some(((c_ops, c_t), (p_ops, p_t))), Some(((cs_ops, cs_t), (ps_ops, ps_t)))) => {
                            let idx_ops_d = non_neg_delta(c_ops, p_ops);
                            let idx_t_d = non_neg_delta(c_t, p_t);
                            let srch_ops_d = non_neg_delta(cs_ops, ps_ops);
                            let srch_t_d = non_neg_delta(cs_t, ps_t);
                            (
                                clamp_rate(idx_ops_d as f64 / elapsed_secs),
                                clamp_rate(srch_ops_d as f64 / elapsed_secs),
                                clamp_latency(safe_divide(idx_t_d as f64, idx_ops_d as f64)),
                                clamp_latency(safe_divide(srch_t_d as f64, srch_ops_d as f64)),
                            )
                        }
                        _ => (NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE),
                    }
                }
                // Missing baseline must never be rendered as idle traffic.
                _ => (NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE),
            };

            IndexRow {
                name: info.name.clone(),
                primary_shard_count: pri,
                total_shard_count,
                rep_known,
                doc_count_known,
                total_size_bytes,
                pri_size_bytes,
                avg_shard_size_bytes,
                doc_count,
                indexing_rate,
                search_rate,
                index_latency_ms,
                search_latency_ms,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn bare(indices: Vec<IndexInfo>, index_stats: HashMap<String, IndexStatsEntry>) -> Snapshot {
        Snapshot {
            captured_at: Utc::now(),
            health: ClusterHealth {
                cluster_name: "c".into(),
                status: HealthStatus::Green,
                node_count: 1,
                active_shards: 0,
                unassigned_shards: 0,
                pending_tasks: 0,
            },
            nodes: vec![],
            node_stats: HashMap::new(),
            indices,
            index_stats,
            allocation: vec![],
        }
    }

    #[test]
    fn tolerant_parse_of_dash_marks_unknown() {
        let idx = IndexInfo {
            name: "closed-idx".into(),
            pri_shards_str: "-".into(),
            rep_str: "-".into(),
            doc_count_str: "-".into(),
        };
        let curr = bare(vec![idx], HashMap::new());
        let rows = calc_index_rows(None, Some(&curr), 10.0);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].rep_known);
        assert!(!rows[0].doc_count_known);
        assert_eq!(rows[0].primary_shard_count, 0);
    }

    #[test]
    fn total_shards_equals_pri_times_one_plus_rep() {
        let idx = IndexInfo {
            name: "i".into(),
            pri_shards_str: "3".into(),
            rep_str: "2".into(),
            doc_count_str: "100".into(),
        };
        let curr = bare(vec![idx], HashMap::new());
        let rows = calc_index_rows(None, Some(&curr), 10.0);
        assert_eq!(rows[0].total_shard_count, 9);
    }

    #[test]
    fn missing_from_prev_is_not_available_never_zero() {
        let idx = IndexInfo {
            name: "fresh".into(),
            pri_shards_str: "1".into(),
            rep_str: "0".into(),
            doc_count_str: "0".into(),
        };
        let mut stats = HashMap::new();
        stats.insert(
            "fresh".to_string(),
            IndexStatsEntry {
                primaries: CounterScope {
                    indexing: Some(IndexingCounters {
                        index_total: 500,
                        index_time_in_millis: 100,
                    }),
                    search: None,
                    store: None,
                },
                total: CounterScope::default(),
            },
        );
        let curr = bare(vec![idx], stats);
        let prev = bare(vec![], HashMap::new());

        let rows = calc_index_rows(Some(&prev), Some(&curr), 10.0);
        assert_eq!(rows[0].indexing_rate, NOT_AVAILABLE);
        assert_eq!(rows[0].search_rate, NOT_AVAILABLE);
    }
}
