//! Graph-database projector
//!
//! Mirrors a node graph snapshot into a [`GraphStore`]. Projection is a
//! best-effort, two-phase upsert:
//!
//! 1. every node vertex, concurrently
//! 2. once phase 1 has finished: parameter vertices with their
//!    `HAS_PARAMETER` edges, `CONNECTED_TO` edges for inputs whose source
//!    is part of the snapshot, and `CHILD_OF` edges for nodes whose parent
//!    is part of the snapshot
//!
//! Failed writes are collected in the [`ProjectionReport`]; they never stop
//! the remaining writes. Vertices from earlier projections that are absent
//! from the snapshot are left in place.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use node_graph::{paths, SceneNode};

use crate::error::StoreError;
use crate::schema::{Edge, NodeVertex, ParameterKeying, ParameterVertex};
use crate::store::GraphStore;

/// A write that did not reach the store
#[derive(Debug)]
pub struct ProjectionFailure {
    /// Vertex key or rendered edge that failed
    pub target: String,
    pub error: StoreError,
}

impl fmt::Display for ProjectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.error)
    }
}

/// Outcome of one projection
#[derive(Debug, Default)]
pub struct ProjectionReport {
    pub nodes_upserted: usize,
    pub parameters_upserted: usize,
    pub edges_upserted: usize,
    /// Inputs and parents left out because they are not in the snapshot
    pub skipped_edges: usize,
    pub failures: Vec<ProjectionFailure>,
}

impl ProjectionReport {
    /// True when every write succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Upsert {
    Parameter {
        node_path: String,
        vertex: ParameterVertex,
    },
    Edge(Edge),
}

impl Upsert {
    fn target(&self) -> String {
        match self {
            Upsert::Parameter { vertex, .. } => vertex.key.clone(),
            Upsert::Edge(edge) => edge.to_string(),
        }
    }
}

/// Projects snapshots into a graph store
pub struct GraphProjector<S: GraphStore + ?Sized> {
    store: Arc<S>,
    keying: ParameterKeying,
}

impl<S: GraphStore + ?Sized> GraphProjector<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_keying(store, ParameterKeying::default())
    }

    pub fn with_keying(store: Arc<S>, keying: ParameterKeying) -> Self {
        Self { store, keying }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn keying(&self) -> ParameterKeying {
        self.keying
    }

    /// Upsert `nodes` with their parameters and relationships
    pub async fn project(&self, nodes: &[SceneNode]) -> ProjectionReport {
        let mut report = ProjectionReport::default();

        let vertices: Vec<NodeVertex> = nodes.iter().map(NodeVertex::from).collect();
        let results = join_all(vertices.iter().map(|v| self.store.upsert_node(v))).await;
        for (vertex, result) in vertices.iter().zip(results) {
            match result {
                Ok(()) => report.nodes_upserted += 1,
                Err(error) => report.failures.push(ProjectionFailure {
                    target: vertex.path.clone(),
                    error,
                }),
            }
        }

        let writes = self.plan(nodes, &mut report);
        let results = join_all(writes.iter().map(|w| self.apply(w))).await;
        for (write, result) in writes.iter().zip(results) {
            match (write, result) {
                (Upsert::Parameter { .. }, Ok(())) => report.parameters_upserted += 1,
                (Upsert::Edge(_), Ok(())) => report.edges_upserted += 1,
                (_, Err(error)) => report.failures.push(ProjectionFailure {
                    target: write.target(),
                    error,
                }),
            }
        }

        for failure in &report.failures {
            log::warn!("Projection write failed: {}", failure);
        }
        log::info!(
            "Projected {} node(s), {} parameter(s), {} edge(s); {} skipped, {} failed",
            report.nodes_upserted,
            report.parameters_upserted,
            report.edges_upserted,
            report.skipped_edges,
            report.failures.len()
        );
        report
    }

    fn plan(&self, nodes: &[SceneNode], report: &mut ProjectionReport) -> Vec<Upsert> {
        let known: HashSet<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        let mut writes = Vec::new();

        for node in nodes {
            for (name, value) in &node.parameters {
                writes.push(Upsert::Parameter {
                    node_path: node.path.clone(),
                    vertex: ParameterVertex {
                        key: self.keying.key(&node.path, name),
                        value: value.clone(),
                    },
                });
            }

            for binding in &node.inputs {
                if known.contains(binding.path.as_str()) {
                    writes.push(Upsert::Edge(Edge::connected(&binding.path, &node.path)));
                } else {
                    report.skipped_edges += 1;
                }
            }

            match paths::parent_of(&node.path) {
                Some(parent) if known.contains(parent) => {
                    writes.push(Upsert::Edge(Edge::child_of(&node.path, parent)));
                }
                Some(_) => report.skipped_edges += 1,
                None => {}
            }
        }
        writes
    }

    async fn apply(&self, write: &Upsert) -> Result<(), StoreError> {
        match write {
            Upsert::Parameter { node_path, vertex } => {
                self.store.upsert_parameter(node_path, vertex).await
            }
            Upsert::Edge(edge) => self.store.upsert_edge(edge).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use node_graph::{InputBinding, ParamValue};

    use super::*;
    use crate::memory::MemoryGraphStore;
    use crate::schema::{EdgeKind, StoreStats};

    fn box_xform() -> Vec<SceneNode> {
        let box1 = SceneNode::new("box1", "box", "/obj/geo1/box1");
        let mut xform = SceneNode::new("xform1", "xform", "/obj/geo1/xform1");
        xform.inputs.push(InputBinding::new(0, "/obj/geo1/box1"));
        xform
            .parameters
            .insert("scale".into(), ParamValue::Number(2.0));
        vec![box1, xform]
    }

    #[tokio::test]
    async fn test_box_xform_projection() {
        let store = Arc::new(MemoryGraphStore::new());
        let projector = GraphProjector::new(Arc::clone(&store));
        let report = projector.project(&box_xform()).await;

        assert!(report.is_complete());
        assert_eq!(report.nodes_upserted, 2);
        assert_eq!(report.parameters_upserted, 1);
        // CONNECTED_TO only; /obj/geo1 is not part of the snapshot
        assert_eq!(report.edges_upserted, 1);
        assert_eq!(report.skipped_edges, 2);

        let edges = store.edges().await.unwrap();
        assert!(edges.contains(&Edge::connected("/obj/geo1/box1", "/obj/geo1/xform1")));
        assert!(edges.contains(&Edge::new(
            EdgeKind::HasParameter,
            "/obj/geo1/xform1",
            "/obj/geo1/xform1#scale"
        )));

        let scale = store.parameter("/obj/geo1/xform1#scale").await.unwrap().unwrap();
        assert_eq!(scale.value, ParamValue::Number(2.0));
    }

    #[tokio::test]
    async fn test_projection_is_idempotent() {
        let store = Arc::new(MemoryGraphStore::new());
        let projector = GraphProjector::new(Arc::clone(&store));
        let nodes = box_xform();

        projector.project(&nodes).await;
        let first = store.stats().await.unwrap();
        let first_edges = store.edges().await.unwrap();

        let report = projector.project(&nodes).await;
        assert!(report.is_complete());
        assert_eq!(store.stats().await.unwrap(), first);
        assert_eq!(store.edges().await.unwrap(), first_edges);
        assert_eq!(
            first,
            StoreStats {
                nodes: 2,
                parameters: 1,
                edges: 2
            }
        );
    }

    #[tokio::test]
    async fn test_child_of_links_nested_nodes() {
        let nodes = vec![
            SceneNode::new("sub", "subnet", "/obj/geo1/sub"),
            SceneNode::new("inner", "box", "/obj/geo1/sub/inner"),
        ];
        let store = Arc::new(MemoryGraphStore::new());
        let report = GraphProjector::new(Arc::clone(&store)).project(&nodes).await;

        assert!(report.is_complete());
        assert_eq!(
            store.edges().await.unwrap(),
            vec![Edge::child_of("/obj/geo1/sub/inner", "/obj/geo1/sub")]
        );
    }

    #[tokio::test]
    async fn test_shared_keying_collapses_parameters_by_name() {
        let mut a = SceneNode::new("a", "xform", "/obj/geo1/a");
        a.parameters.insert("scale".into(), ParamValue::Number(2.0));
        let mut b = SceneNode::new("b", "xform", "/obj/geo1/b");
        b.parameters.insert("scale".into(), ParamValue::Number(2.0));

        let store = Arc::new(MemoryGraphStore::new());
        let projector = GraphProjector::with_keying(Arc::clone(&store), ParameterKeying::Shared);
        projector.project(&[a, b]).await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.parameters, 1);
        assert_eq!(stats.edges, 2);
        assert!(store.parameter("scale").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dangling_input_is_skipped_not_failed() {
        let mut out = SceneNode::new("out", "null", "/obj/geo1/out");
        out.inputs.push(InputBinding::new(0, "/obj/geo1/gone"));

        let store = Arc::new(MemoryGraphStore::new());
        let report = GraphProjector::new(Arc::clone(&store)).project(&[out]).await;
        assert!(report.is_complete());
        assert_eq!(report.edges_upserted, 0);
        assert_eq!(report.skipped_edges, 2);
    }

    #[tokio::test]
    async fn test_projection_through_trait_object() {
        let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
        let report = GraphProjector::new(Arc::clone(&store)).project(&box_xform()).await;
        assert!(report.is_complete());
        assert_eq!(
            store.upstream("/obj/geo1/xform1").await.unwrap(),
            vec!["/obj/geo1/box1"]
        );
    }
}
