//! `Row` adapters binding the derivation engine's `NodeRow`/`IndexRow` to
//! the generic [`Table`](super::table::Table) widget.

use crate::derive::{IndexRow, NodeRow};

use super::table::{Row, SortValue};

/// Node table columns, in display order.
pub const NODE_COLUMNS: &[&str] = &["Name", "Role", "IP", "Idx/s", "Srch/s", "IdxMs", "SrchMs", "Heap", "Shards", "Disk%"];

impl Row for NodeRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_haystack(&self) -> Vec<&str> {
        vec![&self.name, &self.ip]
    }

    fn cell(&self, col: usize) -> String {
        match col {
            0 => self.name.clone(),
            1 => self.role.clone(),
            2 => self.ip.clone(),
            3 => format_rate(self.indexing_rate),
            4 => format_rate(self.search_rate),
            5 => format_latency(self.index_latency_ms),
            6 => format_latency(self.search_latency_ms),
            7 => format_heap(self.heap_used_bytes, self.heap_max_bytes),
            8 => format_signed(self.shard_count),
            9 => format_percent(self.disk_percent),
            _ => String::new(),
        }
    }

    fn sort_value(&self, col: usize) -> SortValue {
        match col {
            0 => SortValue::Text(self.name.clone()),
            1 => SortValue::Text(self.role.clone()),
            2 => SortValue::Text(self.ip.clone()),
            3 => SortValue::Number(self.indexing_rate),
            4 => SortValue::Number(self.search_rate),
            5 => SortValue::Number(self.index_latency_ms),
            6 => SortValue::Number(self.search_latency_ms),
            7 => SortValue::Number(heap_pct(self.heap_used_bytes, self.heap_max_bytes)),
            8 => SortValue::Number(self.shard_count as f64),
            9 => SortValue::Number(self.disk_percent),
            _ => SortValue::Text(String::new()),
        }
    }
}

/// Index table columns, in display order.
pub const INDEX_COLUMNS: &[&str] = &["Name", "Pri", "Total", "Docs", "Size", "AvgShard", "Idx/s", "Srch/s", "IdxMs", "SrchMs"];

impl Row for IndexRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_haystack(&self) -> Vec<&str> {
        vec![&self.name]
    }

    fn cell(&self, col: usize) -> String {
        match col {
            0 => self.name.clone(),
            1 => self.primary_shard_count.to_string(),
            2 => self.total_shard_count.to_string(),
            3 => if self.doc_count_known { self.doc_count.to_string() } else { "-".to_string() },
            4 => format_bytes(self.total_size_bytes),
            5 => format_bytes(self.avg_shard_size_bytes as u64),
            6 => format_rate(self.indexing_rate),
            7 => format_rate(self.search_rate),
            8 => format_latency(self.index_latency_ms),
            9 => format_latency(self.search_latency_ms),
            _ => String::new(),
        }
    }

    fn sort_value(&self, col: usize) -> SortValue {
        match col {
            0 => SortValue::Text(self.name.clone()),
            1 => SortValue::Number(self.primary_shard_count as f64),
            2 => SortValue::Number(self.total_shard_count as f64),
            3 => SortValue::Number(if self.doc_count_known { self.doc_count as f64 } else { -1.0 }),
            4 => SortValue::Number(self.total_size_bytes as f64),
            5 => SortValue::Number(self.avg_shard_size_bytes),
            6 => SortValue::Number(self.indexing_rate),
            7 => SortValue::Number(self.search_rate),
            8 => SortValue::Number(self.index_latency_ms),
            9 => SortValue::Number(self.search_latency_ms),
            _ => SortValue::Text(String::new()),
        }
    }
}

fn heap_pct(used: u64, max: u64) -> f64 {
    if max == 0 {
        crate::derive::consts::NOT_AVAILABLE
    } else {
        used as f64 / max as f64 * 100.0
    }
}

fn format_rate(v: f64) -> String {
    if crate::derive::consts::is_not_available(v) {
        "-".to_string()
    } else {
        format!("{v:.1}")
    }
}

fn format_latency(v: f64) -> String {
    if crate::derive::consts::is_not_available(v) {
        "-".to_string()
    } else {
        format!("{v:.1}ms")
    }
}

fn format_percent(v: f64) -> String {
    if crate::derive::consts::is_not_available(v) {
        "-".to_string()
    } else {
        format!("{v:.0}%")
    }
}

fn format_signed(v: i64) -> String {
    if v < 0 {
        "-".to_string()
    } else {
        v.to_string()
    }
}

fn format_heap(used: u64, max: u64) -> String {
    if max == 0 {
        "-".to_string()
    } else {
        format!("{:.0}%", used as f64 / max as f64 * 100.0)
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}
