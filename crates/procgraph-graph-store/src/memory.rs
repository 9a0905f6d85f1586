//! In-memory graph store

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::schema::{Edge, EdgeKind, NodeVertex, ParameterVertex, StoreStats};
use crate::store::GraphStore;

#[derive(Default)]
struct Inner {
    nodes: IndexMap<String, NodeVertex>,
    parameters: IndexMap<String, ParameterVertex>,
    edges: IndexSet<Edge>,
}

impl Inner {
    fn require_node(&self, path: &str) -> Result<()> {
        if self.nodes.contains_key(path) {
            Ok(())
        } else {
            Err(StoreError::MissingVertex(path.to_string()))
        }
    }

    fn require_endpoint(&self, kind: EdgeKind, key: &str) -> Result<()> {
        if kind.targets_parameter() {
            if self.parameters.contains_key(key) {
                return Ok(());
            }
            return Err(StoreError::MissingVertex(key.to_string()));
        }
        self.require_node(key)
    }
}

/// Graph store kept entirely in memory
///
/// Cheap to create; used by tests and as the default projection target of
/// the command line tool.
#[derive(Default)]
pub struct MemoryGraphStore {
    inner: RwLock<Inner>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(&self, vertex: &NodeVertex) -> Result<()> {
        self.inner
            .write()
            .nodes
            .insert(vertex.path.clone(), vertex.clone());
        Ok(())
    }

    async fn upsert_parameter(&self, node_path: &str, parameter: &ParameterVertex) -> Result<()> {
        let mut inner = self.inner.write();
        inner.require_node(node_path)?;
        inner
            .parameters
            .insert(parameter.key.clone(), parameter.clone());
        inner.edges.insert(Edge::new(
            EdgeKind::HasParameter,
            node_path,
            parameter.key.clone(),
        ));
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<()> {
        let mut inner = self.inner.write();
        inner.require_node(&edge.from)?;
        inner.require_endpoint(edge.kind, &edge.to)?;
        inner.edges.insert(edge.clone());
        Ok(())
    }

    async fn node(&self, path: &str) -> Result<Option<NodeVertex>> {
        Ok(self.inner.read().nodes.get(path).cloned())
    }

    async fn parameter(&self, key: &str) -> Result<Option<ParameterVertex>> {
        Ok(self.inner.read().parameters.get(key).cloned())
    }

    async fn edges(&self) -> Result<Vec<Edge>> {
        Ok(self.inner.read().edges.iter().cloned().collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read();
        Ok(StoreStats {
            nodes: inner.nodes.len(),
            parameters: inner.parameters.len(),
            edges: inner.edges.len(),
        })
    }
}
