//! Graph store contract
//!
//! A store holds vertices and edges of the property graph described in
//! [`crate::schema`]. Every upsert is idempotent by key and atomic on its
//! own; there are no multi-statement transactions across calls.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{Edge, EdgeKind, NodeVertex, ParameterVertex, StoreStats};

/// Storage backend for projected graphs
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert or update a node vertex keyed by its path
    async fn upsert_node(&self, vertex: &NodeVertex) -> Result<()>;

    /// Insert or update a parameter vertex and its `HAS_PARAMETER` edge
    ///
    /// Fails with `MissingVertex` when `node_path` has not been upserted.
    async fn upsert_parameter(&self, node_path: &str, parameter: &ParameterVertex) -> Result<()>;

    /// Insert an edge if it is not already present
    ///
    /// Fails with `MissingVertex` when either endpoint is absent.
    async fn upsert_edge(&self, edge: &Edge) -> Result<()>;

    /// Look up a node vertex by path
    async fn node(&self, path: &str) -> Result<Option<NodeVertex>>;

    /// Look up a parameter vertex by key
    async fn parameter(&self, key: &str) -> Result<Option<ParameterVertex>>;

    /// All edges in insertion order
    async fn edges(&self) -> Result<Vec<Edge>>;

    async fn stats(&self) -> Result<StoreStats>;

    /// Every node that feeds `path`, directly or transitively
    ///
    /// Follows `CONNECTED_TO` edges backwards, breadth first, nearest
    /// sources first. `path` itself is never included.
    async fn upstream(&self, path: &str) -> Result<Vec<String>> {
        let edges = self.edges().await?;
        let mut seen: HashSet<&str> = HashSet::from([path]);
        let mut queue = VecDeque::from([path]);
        let mut lineage = Vec::new();

        while let Some(current) = queue.pop_front() {
            for edge in edges
                .iter()
                .filter(|e| e.kind == EdgeKind::ConnectedTo && e.to == current)
            {
                if seen.insert(edge.from.as_str()) {
                    lineage.push(edge.from.clone());
                    queue.push_back(edge.from.as_str());
                }
            }
        }
        Ok(lineage)
    }
}
