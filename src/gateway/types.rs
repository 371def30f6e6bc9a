//! Wire shapes returned by the ES HTTP endpoints listed in spec.md §6,
//! limited to the fields the core derivation engine consumes (`filter_path`
//! keeps the actual payload small; these structs mirror that subset).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{
    AllocationEntry, ClusterHealth, CounterScope, HealthStatus, IndexInfo, IndexStatsEntry,
    IndexingCounters, NodeInfo, NodeStatsEntry, SearchCounters, StoreCounters,
};

#[derive(Debug, Deserialize)]
pub struct ClusterHealthWire {
    pub cluster_name: String,
    pub status: String,
    pub number_of_nodes: u32,
    pub active_shards: u32,
    pub unassigned_shards: u32,
    pub number_of_pending_tasks: u32,
}

impl From<ClusterHealthWire> for ClusterHealth {
    fn from(w: ClusterHealthWire) -> Self {
        ClusterHealth {
            cluster_name: w.cluster_name,
            status: HealthStatus::from(w.status.as_str()),
            node_count: w.number_of_nodes,
            active_shards: w.active_shards,
            unassigned_shards: w.unassigned_shards,
            pending_tasks: w.number_of_pending_tasks,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CatNodeWire {
    #[serde(rename = "node.role")]
    pub node_role: String,
    pub name: String,
    pub ip: String,
}

impl From<CatNodeWire> for NodeInfo {
    fn from(w: CatNodeWire) -> Self {
        NodeInfo {
            role: w.node_role,
            name: w.name,
            ip: w.ip,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct IndexingStatsWire {
    #[serde(default)]
    pub index_total: u64,
    #[serde(default)]
    pub index_time_in_millis: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchStatsWire {
    #[serde(default)]
    pub query_total: u64,
    #[serde(default)]
    pub query_time_in_millis: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreStatsWire {
    #[serde(default)]
    pub size_in_bytes: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct CounterScopeWire {
    pub indexing: Option<IndexingStatsWire>,
    pub search: Option<SearchStatsWire>,
    pub store: Option<StoreStatsWire>,
}

impl From<CounterScopeWire> for CounterScope {
    fn from(w: CounterScopeWire) -> Self {
        CounterScope {
            indexing: w.indexing.map(|i| IndexingCounters {
                index_total: i.index_total,
                index_time_in_millis: i.index_time_in_millis,
            }),
            search: w.search.map(|s| SearchCounters {
                query_total: s.query_total,
                query_time_in_millis: s.query_time_in_millis,
            }),
            store: w.store.map(|s| StoreCounters {
                size_in_bytes: s.size_in_bytes,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct OsCpuWire {
    #[serde(default)]
    pub percent: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OsStatsWire {
    #[serde(default)]
    pub cpu: Option<OsCpuWire>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JvmMemWire {
    pub heap_used_in_bytes: Option<u64>,
    pub heap_max_in_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JvmStatsWire {
    pub mem: Option<JvmMemWire>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FsTotalWire {
    pub total_in_bytes: Option<u64>,
    pub available_in_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FsStatsWire {
    pub total: Option<FsTotalWire>,
}

#[derive(Debug, Deserialize)]
pub struct NodeStatsEntryWire {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub indices: Option<CounterScopeWireRoot>,
    #[serde(default)]
    pub os: Option<OsStatsWire>,
    #[serde(default)]
    pub jvm: Option<JvmStatsWire>,
    #[serde(default)]
    pub fs: Option<FsStatsWire>,
}

/// `/_nodes/stats` reports one flat `indices` block per node (not split
/// primaries/total the way `/_stats` is) — it stands in for both scopes.
#[derive(Debug, Deserialize, Default)]
pub struct CounterScopeWireRoot {
    pub indexing: Option<IndexingStatsWire>,
    pub search: Option<SearchStatsWire>,
}

#[derive(Debug, Deserialize)]
pub struct NodeStatsResponseWire {
    pub nodes: HashMap<String, NodeStatsEntryWire>,
}

impl NodeStatsResponseWire {
    pub fn into_model(self) -> HashMap<String, NodeStatsEntry> {
        self.nodes
            .into_iter()
            .map(|(node_id, w)| {
                let scope = CounterScope {
                    indexing: w
                        .indices
                        .as_ref()
                        .and_then(|i| i.indexing.as_ref())
                        .map(|i| IndexingCounters {
                            index_total: i.index_total,
                            index_time_in_millis: i.index_time_in_millis,
                        }),
                    search: w
                        .indices
                        .as_ref()
                        .and_then(|i| i.search.as_ref())
                        .map(|s| SearchCounters {
                            query_total: s.query_total,
                            query_time_in_millis: s.query_time_in_millis,
                        }),
                    store: None,
                };
                let entry = NodeStatsEntry {
                    node_id: node_id.clone(),
                    name: w.name,
                    cpu_percent: w.os.and_then(|o| o.cpu).and_then(|c| c.percent),
                    heap_used_bytes: w.jvm.as_ref().and_then(|j| j.mem.as_ref()).and_then(|m| m.heap_used_in_bytes),
                    heap_max_bytes: w.jvm.and_then(|j| j.mem).and_then(|m| m.heap_max_in_bytes),
                    fs_total_bytes: w.fs.as_ref().and_then(|f| f.total.as_ref()).and_then(|t| t.total_in_bytes),
                    fs_available_bytes: w.fs.and_then(|f| f.total).and_then(|t| t.available_in_bytes),
                    primaries: scope,
                    total: scope,
                };
                (node_id, entry)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CatIndexWire {
    pub index: String,
    pub pri: String,
    pub rep: String,
    #[serde(rename = "docs.count")]
    pub docs_count: String,
}

impl From<CatIndexWire> for IndexInfo {
    fn from(w: CatIndexWire) -> Self {
        IndexInfo {
            name: w.index,
            pri_shards_str: w.pri,
            rep_str: w.rep,
            doc_count_str: w.docs_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexStatsEntryWire {
    pub primaries: CounterScopeWire,
    pub total: CounterScopeWire,
}

#[derive(Debug, Deserialize)]
pub struct StatsResponseWire {
    pub indices: HashMap<String, IndexStatsEntryWire>,
}

impl StatsResponseWire {
    pub fn into_model(self) -> HashMap<String, IndexStatsEntry> {
        self.indices
            .into_iter()
            .map(|(name, w)| {
                (
                    name,
                    IndexStatsEntry {
                        primaries: w.primaries.into(),
                        total: w.total.into(),
                    },
                )
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CatAllocationWire {
    pub node: String,
    #[serde(deserialize_with = "de_u32_from_str_or_num")]
    pub shards: u32,
    #[serde(rename = "disk.percent")]
    pub disk_percent: String,
}

fn de_u32_from_str_or_num<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(u32),
    }
    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => Ok(n),
    }
}

impl From<CatAllocationWire> for AllocationEntry {
    fn from(w: CatAllocationWire) -> Self {
        AllocationEntry {
            node: w.node,
            shards: w.shards,
            disk_percent: w.disk_percent,
        }
    }
}

/// The `index.*` subtree extracted by `GetIndexSettings` (spec.md §4.1).
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct IndexSettingsValues(pub HashMap<String, serde_json::Value>);
