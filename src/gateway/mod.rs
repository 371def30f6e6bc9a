//! Thin capability surface over the cluster's HTTP API (spec.md §4.1).
//!
//! This module owns authentication, TLS configuration, response-size
//! capping, and JSON decoding — deliberately out of scope for the
//! observability core, but implemented fully here so the rest of the crate
//! has a real, working collaborator to call.

pub mod error;
pub mod types;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;

use crate::model::{AllocationEntry, ClusterHealth, IndexInfo, IndexStatsEntry, NodeInfo, NodeStatsEntry};
use error::GatewayError;
use types::{
    CatAllocationWire, CatIndexWire, CatNodeWire, ClusterHealthWire, IndexSettingsValues,
    NodeStatsResponseWire, StatsResponseWire,
};

/// Response bodies larger than this are rejected outright (spec.md §4.1).
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// The six reads and two writes spec.md §4.1 names, plus the reachability
/// `ping` used by the CLI at startup (spec.md §2.4 in SPEC_FULL.md).
#[async_trait]
pub trait EsGateway: Send + Sync {
    async fn ping(&self) -> Result<(), GatewayError>;
    async fn get_cluster_health(&self) -> Result<ClusterHealth, GatewayError>;
    async fn get_nodes(&self) -> Result<Vec<NodeInfo>, GatewayError>;
    async fn get_node_stats(&self) -> Result<HashMap<String, NodeStatsEntry>, GatewayError>;
    async fn get_indices(&self) -> Result<Vec<IndexInfo>, GatewayError>;
    async fn get_index_stats(&self) -> Result<HashMap<String, IndexStatsEntry>, GatewayError>;
    async fn get_allocation(&self) -> Result<Vec<AllocationEntry>, GatewayError>;
    async fn delete_index(&self, names: &[String]) -> Result<(), GatewayError>;
    async fn get_index_settings(&self, name: &str) -> Result<IndexSettingsValues, GatewayError>;
    async fn update_index_settings(&self, names: &[String], flat: &HashMap<String, Option<String>>) -> Result<(), GatewayError>;
}

#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, username: Option<String>, password: Option<String>, insecure: bool) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| GatewayError::Unreachable(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            username,
            password,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(user) => req.basic_auth(user, self.password.clone()),
            None => req,
        }
    }

    async fn read_capped(resp: reqwest::Response, endpoint: &str) -> Result<Vec<u8>, GatewayError> {
        let mut stream = resp.bytes_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GatewayError::from_reqwest(endpoint, &e))?;
            buf.extend_from_slice(&chunk);
            if buf.len() > MAX_BODY_BYTES {
                return Err(GatewayError::BodyTooLarge(MAX_BODY_BYTES));
            }
        }
        Ok(buf)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, deadline: Duration) -> Result<T, GatewayError> {
        let req = self.authed(self.client.get(self.url(path)))
            .header("Accept", "application/json")
            .timeout(deadline);
        let resp = req.send().await.map_err(|e| GatewayError::from_reqwest(path, &e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = Self::read_capped(resp, path).await.unwrap_or_default();
            let snippet: String = String::from_utf8_lossy(&body).chars().take(500).collect();
            return Err(GatewayError::from_status(path, status.as_u16(), &snippet));
        }

        let body = Self::read_capped(resp, path).await?;
        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
        deadline: Duration,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .authed(self.client.request(method, self.url(path)))
            .header("Accept", "application/json")
            .timeout(deadline);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| GatewayError::from_reqwest(path, &e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = Self::read_capped(resp, path).await.unwrap_or_default();
            let snippet: String = String::from_utf8_lossy(&body).chars().take(500).collect();
            return Err(GatewayError::from_status(path, status.as_u16(), &snippet));
        }
        Ok(())
    }
}

#[async_trait]
impl EsGateway for HttpGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.authed(self.client.get(self.url("/")))
            .timeout(Duration::from_secs(1))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| GatewayError::from_reqwest("/", &e))
    }

    async fn get_cluster_health(&self) -> Result<ClusterHealth, GatewayError> {
        let wire: ClusterHealthWire = self
            .get_json(
                "/_cluster/health?filter_path=cluster_name,status,number_of_nodes,active_shards,unassigned_shards,number_of_pending_tasks",
                Duration::from_secs(10),
            )
            .await?;
        Ok(wire.into())
    }

    async fn get_nodes(&self) -> Result<Vec<NodeInfo>, GatewayError> {
        let wire: Vec<CatNodeWire> = self
            .get_json("/_cat/nodes?format=json&h=node.role,name,ip", Duration::from_secs(10))
            .await?;
        Ok(wire.into_iter().map(Into::into).collect())
    }

    async fn get_node_stats(&self) -> Result<HashMap<String, NodeStatsEntry>, GatewayError> {
        let wire: NodeStatsResponseWire = self
            .get_json(
                "/_nodes/stats/indices,os,jvm,fs?filter_path=nodes.*.name,nodes.*.roles,nodes.*.indices.indexing,nodes.*.indices.search,nodes.*.os.cpu.percent,nodes.*.jvm.mem,nodes.*.fs.total",
                Duration::from_secs(10),
            )
            .await?;
        Ok(wire.into_model())
    }

    async fn get_indices(&self) -> Result<Vec<IndexInfo>, GatewayError> {
        let wire: Vec<CatIndexWire> = self
            .get_json(
                "/_cat/indices?format=json&h=index,pri,rep,docs.count",
                Duration::from_secs(10),
            )
            .await?;
        Ok(wire.into_iter().map(Into::into).collect())
    }

    async fn get_index_stats(&self) -> Result<HashMap<String, IndexStatsEntry>, GatewayError> {
        let wire: StatsResponseWire = self
            .get_json(
                "/_stats?filter_path=indices.*.primaries.indexing,indices.*.primaries.search,indices.*.primaries.store,indices.*.total.indexing,indices.*.total.search,indices.*.total.store",
                Duration::from_secs(10),
            )
            .await?;
        Ok(wire.into_model())
    }

    async fn get_allocation(&self) -> Result<Vec<AllocationEntry>, GatewayError> {
        let wire: Vec<CatAllocationWire> = self
            .get_json("/_cat/allocation?format=json&h=node,shards,disk.percent", Duration::from_secs(10))
            .await?;
        Ok(wire.into_iter().map(Into::into).collect())
    }

    async fn delete_index(&self, names: &[String]) -> Result<(), GatewayError> {
        if names.is_empty() {
            return Err(GatewayError::InvalidArgument("delete_index requires at least one name".into()));
        }
        let joined = names.iter().map(|n| escape_index_name(n)).collect::<Vec<_>>().join(",");
        self.send_json::<()>(reqwest::Method::DELETE, &format!("/{joined}"), None, Duration::from_secs(10))
            .await
    }

    async fn get_index_settings(&self, name: &str) -> Result<IndexSettingsValues, GatewayError> {
        if name.is_empty() {
            return Err(GatewayError::InvalidArgument("get_index_settings requires a name".into()));
        }
        let path = format!("/{}/_settings?filter_path=*.settings.index", escape_index_name(name));
        let raw: Value = self.get_json(&path, Duration::from_secs(10)).await?;
        let index_subtree = raw
            .as_object()
            .and_then(|m| m.values().next())
            .and_then(|v| v.get("settings"))
            .and_then(|v| v.get("index"))
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));
        let map: HashMap<String, Value> = index_subtree
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(IndexSettingsValues(map))
    }

    async fn update_index_settings(&self, names: &[String], flat: &HashMap<String, Option<String>>) -> Result<(), GatewayError> {
        if flat.is_empty() {
            return Ok(());
        }
        if names.is_empty() {
            return Err(GatewayError::InvalidArgument("update_index_settings requires at least one name".into()));
        }
        let joined = names.iter().map(|n| escape_index_name(n)).collect::<Vec<_>>().join(",");
        let nested = nest_flat_settings(flat);
        let body = serde_json::json!({ "index": nested });
        self.send_json(reqwest::Method::PUT, &format!("/{joined}/_settings"), Some(&body), Duration::from_secs(10))
            .await
    }
}

fn escape_index_name(name: &str) -> String {
    // ES index names never contain characters needing percent-encoding in
    // practice (no slashes, no spaces are permitted cluster-side), but we
    // still escape defensively for names containing reserved URL characters.
    percent_encode_path_segment(name)
}

fn percent_encode_path_segment(segment: &str) -> String {
    segment
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b',' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// Converts flat dotted keys (`index.routing.allocation.include._name`) into
/// a nested JSON tree, merging siblings at every shared prefix rather than
/// overwriting them (spec.md §4.1, §9 "Nested-key merge"). `None` values
/// become JSON `null`, clearing the setting server-side.
pub fn nest_flat_settings(flat: &HashMap<String, Option<String>>) -> Value {
    let mut root = serde_json::Map::new();
    for (key, value) in flat {
        let parts: Vec<&str> = key.split('.').collect();
        insert_nested(&mut root, &parts, value.clone());
    }
    Value::Object(root)
}

fn insert_nested(node: &mut serde_json::Map<String, Value>, parts: &[&str], value: Option<String>) {
    match parts {
        [] => {}
        [last] => {
            let v = match value {
                Some(s) => Value::String(s),
                None => Value::Null,
            };
            node.insert((*last).to_string(), v);
        }
        [head, rest @ ..] => {
            let entry = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Value::Object(child) = entry {
                insert_nested(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_key_merge_preserves_siblings_sharing_a_prefix() {
        let mut flat = HashMap::new();
        flat.insert("routing.allocation.include._name".to_string(), Some("node-a".to_string()));
        flat.insert("routing.allocation.include._ip".to_string(), Some("10.0.0.1".to_string()));

        let nested = nest_flat_settings(&flat);
        let include = &nested["routing"]["allocation"]["include"];
        assert_eq!(include["_name"], "node-a");
        assert_eq!(include["_ip"], "10.0.0.1");
    }

    #[test]
    fn nested_key_merge_handles_three_deep_shared_prefix() {
        let mut flat = HashMap::new();
        flat.insert("a.b.c".to_string(), Some("1".to_string()));
        flat.insert("a.b.d".to_string(), Some("2".to_string()));
        flat.insert("a.e".to_string(), Some("3".to_string()));

        let nested = nest_flat_settings(&flat);
        assert_eq!(nested["a"]["b"]["c"], "1");
        assert_eq!(nested["a"]["b"]["d"], "2");
        assert_eq!(nested["a"]["e"], "3");
    }

    #[test]
    fn null_sentinel_clears_setting() {
        let mut flat = HashMap::new();
        flat.insert("refresh_interval".to_string(), None);
        let nested = nest_flat_settings(&flat);
        assert!(nested["refresh_interval"].is_null());
    }

    #[test]
    fn escape_percent_encodes_reserved_characters() {
        assert_eq!(percent_encode_path_segment("my index"), "my%20index");
        assert_eq!(percent_encode_path_segment("logs-2024.01.01"), "logs-2024.01.01");
    }
}
