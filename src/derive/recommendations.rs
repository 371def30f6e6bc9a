//! Recommendation rules (spec.md §4.3.5), modeled as an ordered list of
//! independent rule functions in the style of the prior generation's
//! `analysis::rules` advisors — each rule inspects the derived frame and
//! emits zero or more [`Recommendation`]s, and `calc_recommendations` runs
//! them in the fixed order the spec mandates (tests pin that order).

use super::cluster::ClusterResources;
use super::indices::IndexRow;
use super::nodes::NodeRow;
use crate::model::{HealthStatus, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Resource,
    Shard,
    IndexConfig,
    Hotspot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub detail: String,
}

/// Display-colorization thresholds, distinct from the recommendation rules
/// above — used by the renderer to tint individual cells, not to generate
/// advice (spec.md §4.3.5 final paragraph).
pub mod display_thresholds {
    pub const CPU_WARNING: f64 = 80.0;
    pub const CPU_CRITICAL: f64 = 90.0;
    pub const HEAP_WARNING: f64 = 75.0;
    pub const HEAP_CRITICAL: f64 = 85.0;
    pub const STORAGE_WARNING: f64 = 80.0;
    pub const STORAGE_CRITICAL: f64 = 90.0;
    pub const SEARCH_LATENCY_CRITICAL_MS: f64 = 1000.0;
    pub const INDEX_LATENCY_WARNING_MS: f64 = 500.0;
}

/// Role strings count as a data node if they contain any of these letters —
/// the generic `d` plus the ES8 data-tier tags (hot/warm/cold/frozen,
/// `h`/`w`/`c`/`f`) and `s` for the dedicated search tier.
fn is_data_role(role: &str) -> bool {
    role.chars().any(|c| "dhwcfs".contains(c))
}

fn health_rule(snap: &Snapshot) -> Vec<Recommendation> {
    match snap.health.status {
        HealthStatus::Red => vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Shard,
            title: "Cluster health is red".to_string(),
            detail: "One or more primary shards are unassigned.".to_string(),
        }],
        HealthStatus::Yellow => vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Shard,
            title: "Cluster health is yellow".to_string(),
            detail: "One or more replica shards are unassigned.".to_string(),
        }],
        _ => Vec::new(),
    }
}

fn unassigned_shards_rule(snap: &Snapshot) -> Vec<Recommendation> {
    if snap.health.unassigned_shards > 0 {
        vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Shard,
            title: "Unassigned shards present".to_string(),
            detail: format!("{} shard(s) are unassigned.", snap.health.unassigned_shards),
        }]
    } else {
        Vec::new()
    }
}

fn cpu_rule(resources: &ClusterResources) -> Vec<Recommendation> {
    use display_thresholds::*;
    if resources.avg_cpu_pct > CPU_CRITICAL {
        vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Resource,
            title: "CPU usage critical".to_string(),
            detail: format!("Average CPU at {:.1}%.", resources.avg_cpu_pct),
        }]
    } else if resources.avg_cpu_pct > CPU_WARNING {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Resource,
            title: "CPU usage elevated".to_string(),
            detail: format!("Average CPU at {:.1}%.", resources.avg_cpu_pct),
        }]
    } else {
        Vec::new()
    }
}

fn heap_rule(resources: &ClusterResources) -> Vec<Recommendation> {
    use display_thresholds::*;
    if resources.avg_heap_pct > HEAP_CRITICAL {
        vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Resource,
            title: "Heap usage critical".to_string(),
            detail: format!("Average heap at {:.1}%.", resources.avg_heap_pct),
        }]
    } else if resources.avg_heap_pct > HEAP_WARNING {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Resource,
            title: "Heap usage elevated".to_string(),
            detail: format!("Average heap at {:.1}%.", resources.avg_heap_pct),
        }]
    } else {
        Vec::new()
    }
}

fn storage_rule(resources: &ClusterResources) -> Vec<Recommendation> {
    use display_thresholds::*;
    if resources.used_pct > STORAGE_CRITICAL {
        vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Resource,
            title: "Disk usage critical".to_string(),
            detail: format!("{:.1}% of cluster storage used.", resources.used_pct),
        }]
    } else if resources.used_pct > STORAGE_WARNING {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Resource,
            title: "Disk usage elevated".to_string(),
            detail: format!("{:.1}% of cluster storage used.", resources.used_pct),
        }]
    } else {
        Vec::new()
    }
}

fn shards_per_heap_rule(snap: &Snapshot, resources: &ClusterResources) -> Vec<Recommendation> {
    let heap_gb = resources.total_heap_max_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    if heap_gb == 0.0 {
        return Vec::new();
    }
    let ratio = snap.health.active_shards as f64 / heap_gb;
    if ratio > 40.0 {
        vec![Recommendation {
            severity: Severity::Critical,
            category: Category::Shard,
            title: "Too many shards per heap GB".to_string(),
            detail: format!("{:.1} shards per GB of heap.", ratio),
        }]
    } else if ratio > 20.0 {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Shard,
            title: "High shards-per-heap ratio".to_string(),
            detail: format!("{:.1} shards per GB of heap.", ratio),
        }]
    } else {
        Vec::new()
    }
}

fn zero_replica_rule(index_rows: &[IndexRow]) -> Vec<Recommendation> {
    let count = index_rows
        .iter()
        .filter(|r| {
            !r.is_system()
                && r.rep_known
                && r.total_shard_count == r.primary_shard_count
                && r.primary_shard_count > 0
        })
        .count();
    if count > 0 {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::IndexConfig,
            title: "Indices without replicas".to_string(),
            detail: format!("{count} non-system index(es) have zero replicas."),
        }]
    } else {
        Vec::new()
    }
}

fn shard_size_rule(index_rows: &[IndexRow], node_rows: &[NodeRow]) -> Vec<Recommendation> {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    let mut out = Vec::new();

    let oversized = index_rows.iter().any(|r| r.avg_shard_size_bytes > 50.0 * GIB);
    if oversized {
        out.push(Recommendation {
            severity: Severity::Warning,
            category: Category::IndexConfig,
            title: "Oversized shards".to_string(),
            detail: "At least one index has an average shard size above 50 GiB.".to_string(),
        });
    }

    let data_node_count = node_rows.iter().filter(|n| is_data_role(&n.role)).count().max(1);
    let undersized_count = index_rows
        .iter()
        .filter(|r| r.avg_shard_size_bytes > 0.0 && r.avg_shard_size_bytes < GIB)
        .count();
    if undersized_count > 10 * data_node_count {
        out.push(Recommendation {
            severity: Severity::Warning,
            category: Category::IndexConfig,
            title: "Over-sharding detected".to_string(),
            detail: format!(
                "{undersized_count} index(es) have shards under 1 GiB, more than 10x the data-node count ({data_node_count})."
            ),
        });
    }

    out
}

fn data_to_heap_ratio_rule(index_rows: &[IndexRow], resources: &ClusterResources) -> Vec<Recommendation> {
    if resources.total_heap_max_bytes == 0 {
        return Vec::new();
    }
    let total_index_bytes: u64 = index_rows.iter().map(|r| r.total_size_bytes).sum();
    let ratio = total_index_bytes as f64 / resources.total_heap_max_bytes as f64;
    if ratio > 30.0 {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Resource,
            title: "High data-to-heap ratio".to_string(),
            detail: format!("{:.1}x data-to-heap-max ratio.", ratio),
        }]
    } else {
        Vec::new()
    }
}

fn single_data_node_rule(node_rows: &[NodeRow]) -> Vec<Recommendation> {
    let data_nodes = node_rows.iter().filter(|n| is_data_role(&n.role)).count();
    if data_nodes == 1 {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Shard,
            title: "Single data node".to_string(),
            detail: "No replica shards can be assigned with only one data node.".to_string(),
        }]
    } else {
        Vec::new()
    }
}

fn heap_hotspot_rule(node_rows: &[NodeRow]) -> Vec<Recommendation> {
    let utilizations: Vec<f64> = node_rows
        .iter()
        .filter(|n| n.heap_max_bytes > 0)
        .map(|n| n.heap_used_bytes as f64 / n.heap_max_bytes as f64)
        .collect();
    if utilizations.is_empty() {
        return Vec::new();
    }
    let max = utilizations.iter().cloned().fold(f64::MIN, f64::max);
    let min = utilizations.iter().cloned().fold(f64::MAX, f64::min);
    if max - min > 0.30 {
        vec![Recommendation {
            severity: Severity::Warning,
            category: Category::Hotspot,
            title: "Heap utilization hotspot".to_string(),
            detail: format!(
                "Heap utilization spread is {:.0} percentage points across nodes.",
                (max - min) * 100.0
            ),
        }]
    } else {
        Vec::new()
    }
}

/// Runs every rule in the fixed order spec.md §4.3.5 mandates.
pub fn calc_recommendations(
    snap: &Snapshot,
    resources: &ClusterResources,
    node_rows: &[NodeRow],
    index_rows: &[IndexRow],
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    out.extend(health_rule(snap));
    out.extend(unassigned_shards_rule(snap));
    out.extend(cpu_rule(resources));
    out.extend(heap_rule(resources));
    out.extend(storage_rule(resources));
    out.extend(shards_per_heap_rule(snap, resources));
    out.extend(zero_replica_rule(index_rows));
    out.extend(shard_size_rule(index_rows, node_rows));
    out.extend(data_to_heap_ratio_rule(index_rows, resources));
    out.extend(single_data_node_rule(node_rows));
    out.extend(heap_hotspot_rule(node_rows));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn health(status: HealthStatus, unassigned: u32) -> Snapshot {
        Snapshot {
            captured_at: Utc::now(),
            health: ClusterHealth {
                cluster_name: "c".into(),
                status,
                node_count: 1,
                active_shards: 1,
                unassigned_shards: unassigned,
                pending_tasks: 0,
            },
            nodes: vec![],
            node_stats: HashMap::new(),
            indices: vec![],
            index_stats: HashMap::new(),
            allocation: vec![],
        }
    }

    fn index_row(name: &str, pri: u32, total: u32, rep_known: bool) -> IndexRow {
        IndexRow {
            name: name.to_string(),
            primary_shard_count: pri,
            total_shard_count: total,
            rep_known,
            doc_count_known: true,
            total_size_bytes: 0,
            pri_size_bytes: 0,
            avg_shard_size_bytes: 0.0,
            doc_count: 0,
            indexing_rate: -1.0,
            search_rate: -1.0,
            index_latency_ms: -1.0,
            search_latency_ms: -1.0,
        }
    }

    // Scenario F: zero-replica detection.
    #[test]
    fn scenario_f_zero_replica_detection() {
        let rows = vec![
            index_row("myindex", 3, 3, true),
            index_row("other", 2, 4, true),
            index_row(".system", 1, 1, true),
            index_row("closed", 1, 1, false),
        ];
        let recs = zero_replica_rule(&rows);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].detail.contains('1'));
    }

    #[test]
    fn health_red_is_critical_shard() {
        let snap = health(HealthStatus::Red, 0);
        let recs = health_rule(&snap);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Critical);
        assert_eq!(recs[0].category, Category::Shard);
    }

    #[test]
    fn health_yellow_is_warning() {
        let snap = health(HealthStatus::Yellow, 0);
        let recs = health_rule(&snap);
        assert_eq!(recs[0].severity, Severity::Warning);
    }

    #[test]
    fn shards_per_heap_skipped_when_heap_zero() {
        let snap = health(HealthStatus::Green, 0);
        let resources = ClusterResources::default();
        assert!(shards_per_heap_rule(&snap, &resources).is_empty());
    }

    #[test]
    fn single_data_node_detected_by_role_letters() {
        let rows = vec![NodeRow {
            id: "1".into(),
            name: "n1".into(),
            role: "d".into(),
            ip: "".into(),
            indexing_rate: -1.0,
            search_rate: -1.0,
            index_latency_ms: -1.0,
            search_latency_ms: -1.0,
            heap_used_bytes: 0,
            heap_max_bytes: 0,
            shard_count: 0,
            disk_percent: 0.0,
        }];
        let recs = single_data_node_rule(&rows);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn heap_hotspot_detects_wide_spread() {
        let mk = |used: u64, max: u64| NodeRow {
            id: "x".into(),
            name: "x".into(),
            role: "d".into(),
            ip: "".into(),
            indexing_rate: -1.0,
            search_rate: -1.0,
            index_latency_ms: -1.0,
            search_latency_ms: -1.0,
            heap_used_bytes: used,
            heap_max_bytes: max,
            shard_count: 0,
            disk_percent: 0.0,
        };
        let rows = vec![mk(10, 100), mk(50, 100)];
        assert!(heap_hotspot_rule(&rows).is_empty());
        let rows = vec![mk(10, 100), mk(45, 100)];
        assert!(!heap_hotspot_rule(&rows).is_empty());
    }

    #[test]
    fn fixed_order_is_preserved() {
        // Construct a snapshot/state that trips multiple rules at once and
        // verify the emission order matches spec.md's fixed sequence.
        let snap = health(HealthStatus::Red, 5);
        let resources = ClusterResources {
            avg_cpu_pct: 95.0,
            avg_heap_pct: 90.0,
            used_bytes: 95,
            total_bytes: 100,
            used_pct: 95.0,
            total_heap_max_bytes: 0,
        };
        let recs = calc_recommendations(&snap, &resources, &[], &[]);
        assert_eq!(recs[0].title, "Cluster health is red");
        assert_eq!(recs[1].title, "Unassigned shards present");
        assert_eq!(recs[2].title, "CPU usage critical");
        assert_eq!(recs[3].title, "Heap usage critical");
        assert_eq!(recs[4].title, "Disk usage critical");
    }
}
