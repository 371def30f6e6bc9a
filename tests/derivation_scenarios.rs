//! End-to-end derivation scenarios from spec.md §8, exercised across the
//! `model` -> `derive` boundary rather than against a single function.

use std::collections::HashMap;

use chrono::Utc;
use esdash::derive::{derive, Category, Severity};
use esdash::model::{
    AllocationEntry, ClusterHealth, CounterScope, HealthStatus, IndexInfo, IndexStatsEntry,
    IndexingCounters, NodeInfo, NodeStatsEntry, Snapshot,
};

fn base_health() -> ClusterHealth {
    ClusterHealth {
        cluster_name: "prod".into(),
        status: HealthStatus::Green,
        node_count: 1,
        active_shards: 10,
        unassigned_shards: 0,
        pending_tasks: 0,
    }
}

fn node_stats(index_total: u64, index_time: u64) -> HashMap<String, NodeStatsEntry> {
    let mut m = HashMap::new();
    m.insert(
        "n1".to_string(),
        NodeStatsEntry {
            node_id: "n1".into(),
            name: "n1".into(),
            cpu_percent: Some(10.0),
            heap_used_bytes: Some(100),
            heap_max_bytes: Some(1000),
            fs_total_bytes: Some(1_000_000),
            fs_available_bytes: Some(500_000),
            primaries: CounterScope {
                indexing: Some(IndexingCounters { index_total, index_time_in_millis: index_time }),
                search: None,
                store: None,
            },
            total: CounterScope::default(),
        },
    );
    m
}

fn snapshot_with_node_stats(node_stats: HashMap<String, NodeStatsEntry>) -> Snapshot {
    Snapshot {
        captured_at: Utc::now(),
        health: base_health(),
        nodes: vec![NodeInfo { role: "d".into(), name: "n1".into(), ip: "10.0.0.1".into() }],
        node_stats,
        indices: Vec::new(),
        index_stats: HashMap::new(),
        allocation: vec![AllocationEntry { node: "n1".into(), shards: 10, disk_percent: "50".into() }],
    }
}

#[test]
fn scenario_c_counter_reset_yields_zero_rate_not_negative() {
    let prev = snapshot_with_node_stats(node_stats(5000, 2000));
    let curr = snapshot_with_node_stats(node_stats(100, 50));

    let frame = derive(Some(&prev), Some(&curr)).expect("derivation succeeds");
    assert_eq!(frame.metrics.indexing_rate, 0.0);
    assert_eq!(frame.metrics.index_latency_ms, 0.0);
}

fn index_info(name: &str, pri: &str, rep: &str) -> IndexInfo {
    IndexInfo {
        name: name.to_string(),
        pri_shards_str: pri.to_string(),
        rep_str: rep.to_string(),
        doc_count_str: "100".to_string(),
    }
}

#[test]
fn scenario_f_zero_replica_detection_excludes_system_and_unknown_indices() {
    let mut indices = vec![
        index_info("myindex", "3", "0"),
        index_info("other", "2", "1"),
        index_info(".system", "1", "0"),
    ];
    // `closed` has replica count unknown (spec.md's `repKnown=false`) — the
    // cat API reports this as an empty rep string for a closed index.
    indices.push(index_info("closed", "1", ""));

    let mut index_stats = HashMap::new();
    for idx in &indices {
        index_stats.insert(idx.name.clone(), IndexStatsEntry::default());
    }

    let curr = Snapshot {
        captured_at: Utc::now(),
        health: base_health(),
        nodes: vec![NodeInfo { role: "d".into(), name: "n1".into(), ip: "10.0.0.1".into() }],
        node_stats: node_stats(0, 0),
        indices,
        index_stats,
        allocation: Vec::new(),
    };

    let frame = derive(None, Some(&curr)).expect("derivation succeeds");
    let zero_replica_recs: Vec<_> = frame
        .recommendations
        .iter()
        .filter(|r| r.category == Category::IndexConfig && r.severity == Severity::Warning && r.title.to_lowercase().contains("replica"))
        .collect();

    assert_eq!(zero_replica_recs.len(), 1, "expected exactly one zero-replica recommendation, got {zero_replica_recs:?}");
    assert!(zero_replica_recs[0].detail.contains('1'), "detail should mention the affected index count");
}
