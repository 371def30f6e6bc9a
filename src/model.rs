//! The immutable snapshot data model (spec.md §3).
//!
//! A [`Snapshot`] is a coherent capture of cluster state at one instant. The
//! dashboard keeps at most two of these alive at a time (`previous`,
//! `current`) — the one before that is simply dropped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Cluster health status as reported by `/_cluster/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl From<&str> for HealthStatus {
    fn from(s: &str) -> Self {
        match s {
            "green" => HealthStatus::Green,
            "yellow" => HealthStatus::Yellow,
            "red" => HealthStatus::Red,
            _ => HealthStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: HealthStatus,
    pub node_count: u32,
    pub active_shards: u32,
    pub unassigned_shards: u32,
    pub pending_tasks: u32,
}

/// An entry from `/_cat/nodes`, used to enrich node rows with role/ip.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub role: String,
    pub name: String,
    pub ip: String,
}

/// Indexing/search counter triple as reported for a primaries-or-total scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexingCounters {
    pub index_total: u64,
    pub index_time_in_millis: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCounters {
    pub query_total: u64,
    pub query_time_in_millis: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCounters {
    pub size_in_bytes: u64,
}

/// The indexing/search/store counter triple for one scope (primaries or total).
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterScope {
    pub indexing: Option<IndexingCounters>,
    pub search: Option<SearchCounters>,
    pub store: Option<StoreCounters>,
}

/// Per-node resource and counter readings from `/_nodes/stats`.
#[derive(Debug, Clone)]
pub struct NodeStatsEntry {
    pub node_id: String,
    pub name: String,
    pub cpu_percent: Option<f64>,
    pub heap_used_bytes: Option<u64>,
    pub heap_max_bytes: Option<u64>,
    pub fs_total_bytes: Option<u64>,
    pub fs_available_bytes: Option<u64>,
    pub primaries: CounterScope,
    pub total: CounterScope,
}

/// An entry from `/_cat/indices`.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub name: String,
    pub pri_shards_str: String,
    pub rep_str: String,
    pub doc_count_str: String,
}

/// Per-index primaries/total counter pair from `/_stats`.
#[derive(Debug, Clone, Default)]
pub struct IndexStatsEntry {
    pub primaries: CounterScope,
    pub total: CounterScope,
}

/// An entry from `/_cat/allocation`.
#[derive(Debug, Clone)]
pub struct AllocationEntry {
    pub node: String,
    pub shards: u32,
    pub disk_percent: String,
}

/// A coherent capture of cluster state at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub health: ClusterHealth,
    pub nodes: Vec<NodeInfo>,
    pub node_stats: HashMap<String, NodeStatsEntry>,
    pub indices: Vec<IndexInfo>,
    pub index_stats: HashMap<String, IndexStatsEntry>,
    pub allocation: Vec<AllocationEntry>,
}

impl Snapshot {
    /// Looks up node identity (role, ip) by name; `NodeStats` is keyed by
    /// node id while `Nodes` is keyed by name, so callers join on name.
    pub fn node_info_by_name(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn allocation_for_node(&self, name: &str) -> Option<&AllocationEntry> {
        self.allocation.iter().find(|a| a.node == name)
    }
}
