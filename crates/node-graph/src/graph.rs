//! The node graph model
//!
//! `NodeGraph` is the canonical in-memory representation of a build: nodes
//! in creation order keyed by name, a path registry, and the wiring records
//! that are still waiting for their source node to be created. It owns the
//! mutation invariants:
//!
//! - node names and paths are unique
//! - node types come from the catalog
//! - a failed mutation leaves the graph unchanged
//!
//! Cycles are not checked here; see [`crate::validation::detect_cycle`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::TypeCatalog;
use crate::error::{GraphError, Result};
use crate::paths::{self, PathRegistry};
use crate::types::{InputBinding, NodeName, SceneNode};
use crate::value::ParamValue;

/// What happens when an input index that is already wired is wired again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringPolicy {
    /// The new source replaces the old one at that index
    #[default]
    ReplaceByIndex,
    /// Both records are kept
    Append,
}

/// What happens when the source of a wire does not exist yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceResolution {
    /// Keep the wire pending until a node with that name is created
    #[default]
    Deferred,
    /// Reject the wire with `UnknownNode`
    Strict,
}

/// Mutation policies for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPolicy {
    #[serde(default)]
    pub wiring: WiringPolicy,
    #[serde(default)]
    pub sources: SourceResolution,
}

/// Result of a successful `wire` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireStatus {
    /// The binding was recorded on the target
    Bound(InputBinding),
    /// The source does not exist yet; the binding is recorded once it does
    Deferred,
}

/// A wire whose source node has not been created yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWire {
    pub source: NodeName,
    pub target: NodeName,
    pub input_index: u32,
}

impl fmt::Display for PendingWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}[{}] (source never created)",
            self.source, self.target, self.input_index
        )
    }
}

/// In-memory node graph for one build session
#[derive(Debug, Clone)]
pub struct NodeGraph {
    catalog: Arc<TypeCatalog>,
    policy: GraphPolicy,
    nodes: IndexMap<NodeName, SceneNode>,
    paths: PathRegistry,
    pending: Vec<PendingWire>,
}

impl NodeGraph {
    /// Create an empty graph validated against `catalog`
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self::with_policy(catalog, GraphPolicy::default())
    }

    pub fn with_policy(catalog: Arc<TypeCatalog>, policy: GraphPolicy) -> Self {
        Self {
            catalog,
            policy,
            nodes: IndexMap::new(),
            paths: PathRegistry::new(),
            pending: Vec::new(),
        }
    }

    /// Rebuild a graph from a structural description
    ///
    /// Nodes are replayed in order through `create_node` and
    /// `set_parameter`; inputs are bound by path once every node exists.
    /// Entries that fail (duplicate names, unknown types, inputs whose
    /// source is not in the description) are skipped and returned.
    pub fn load(
        catalog: Arc<TypeCatalog>,
        nodes: impl IntoIterator<Item = SceneNode>,
    ) -> (Self, Vec<GraphError>) {
        let mut graph = Self::new(catalog);
        let mut errors = Vec::new();
        let mut wiring = Vec::new();

        for node in nodes {
            let parent = node.parent_location().unwrap_or("");
            if let Err(e) = graph.create_node(&node.name, &node.node_type, parent) {
                errors.push(e);
                continue;
            }
            for (key, value) in node.parameters {
                if let Err(e) = graph.set_parameter(&node.name, &key, value) {
                    errors.push(e);
                }
            }
            wiring.push((node.name, node.inputs));
        }

        for (target, inputs) in wiring {
            for binding in inputs {
                match graph.paths.name_for(&binding.path).map(str::to_string) {
                    Some(source) => {
                        if let Err(e) = graph.wire(&source, &target, binding.index) {
                            errors.push(e);
                        }
                    }
                    None => errors.push(GraphError::unknown_node(binding.path)),
                }
            }
        }

        (graph, errors)
    }

    /// Create a node and return its path
    pub fn create_node(&mut self, name: &str, node_type: &str, parent: &str) -> Result<String> {
        validate_name(name)?;
        if self.nodes.contains_key(name) {
            return Err(GraphError::duplicate(name));
        }
        if !self.catalog.contains(node_type) {
            return Err(GraphError::unknown_type(node_type));
        }

        let path = self.paths.register(name, parent)?;
        self.nodes
            .insert(name.to_string(), SceneNode::new(name, node_type, path.clone()));
        self.resolve_pending(name);

        log::debug!("Created node '{}' ({}) at {}", name, node_type, path);
        Ok(path)
    }

    /// Wire the output of `source` into input `input_index` of `target`
    pub fn wire(&mut self, source: &str, target: &str, input_index: u32) -> Result<WireStatus> {
        if !self.nodes.contains_key(target) {
            return Err(GraphError::unknown_node(target));
        }

        let Some(source_path) = self.paths.resolve(source).map(str::to_string) else {
            return match self.policy.sources {
                SourceResolution::Strict => Err(GraphError::unknown_node(source)),
                SourceResolution::Deferred => {
                    self.defer(source, target, input_index);
                    Ok(WireStatus::Deferred)
                }
            };
        };

        if self.policy.wiring == WiringPolicy::ReplaceByIndex {
            self.cancel_pending(target, input_index);
        }
        let binding = InputBinding::new(input_index, source_path);
        self.bind(target, binding.clone());
        Ok(WireStatus::Bound(binding))
    }

    /// Set a parameter value, replacing any previous value for that name
    pub fn set_parameter(
        &mut self,
        node: &str,
        parameter: &str,
        value: impl Into<ParamValue>,
    ) -> Result<()> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| GraphError::unknown_node(node))?;
        entry.parameters.insert(parameter.to_string(), value.into());
        Ok(())
    }

    /// Full graph state in creation order
    pub fn snapshot(&self) -> Vec<SceneNode> {
        self.nodes.values().cloned().collect()
    }

    /// Remove every node and pending wire
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.paths.clear();
        self.pending.clear();
    }

    pub fn get(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.get(name)
    }

    /// Path of a named node
    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.paths.resolve(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct node types currently in the graph
    pub fn node_types(&self) -> BTreeSet<&str> {
        self.nodes.values().map(|n| n.node_type.as_str()).collect()
    }

    /// Wires still waiting for their source node
    pub fn pending_wires(&self) -> &[PendingWire] {
        &self.pending
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    fn bind(&mut self, target: &str, binding: InputBinding) {
        let replace = self.policy.wiring == WiringPolicy::ReplaceByIndex;
        if let Some(node) = self.nodes.get_mut(target) {
            node.bind_input(binding, replace);
        }
    }

    /// Drop pending wires an explicit wire to the same slot supersedes
    fn cancel_pending(&mut self, target: &str, input_index: u32) {
        self.pending
            .retain(|w| !(w.target == target && w.input_index == input_index));
    }

    fn defer(&mut self, source: &str, target: &str, input_index: u32) {
        if self.policy.wiring == WiringPolicy::ReplaceByIndex {
            self.cancel_pending(target, input_index);
        }
        log::debug!(
            "Deferring wire {} -> {}[{}] until '{}' exists",
            source,
            target,
            input_index,
            source
        );
        self.pending.push(PendingWire {
            source: source.to_string(),
            target: target.to_string(),
            input_index,
        });
    }

    fn resolve_pending(&mut self, source: &str) {
        let Some(path) = self.paths.resolve(source).map(str::to_string) else {
            return;
        };
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|w| w.source == source);
        self.pending = waiting;

        for wire in ready {
            self.bind(&wire.target, InputBinding::new(wire.input_index, path.clone()));
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GraphError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if name.contains(paths::SEPARATOR) {
        return Err(GraphError::InvalidName {
            name: name.to_string(),
            reason: "name contains a path separator",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeEntry;

    fn catalog() -> Arc<TypeCatalog> {
        Arc::new(
            TypeCatalog::from_entries(
                ["box", "xform", "merge", "null", "sphere"]
                    .into_iter()
                    .map(|t| TypeEntry::new(t, vec![])),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_create_node_path() {
        let mut graph = NodeGraph::new(catalog());
        let path = graph.create_node("box1", "box", "/obj/geo1").unwrap();
        assert_eq!(path, "/obj/geo1/box1");

        let node = graph.get("box1").unwrap();
        assert_eq!(node.path, "/obj/geo1/box1");
        assert_eq!(node.node_type, "box");
        assert!(node.inputs.is_empty());
        assert!(node.parameters.is_empty());
    }

    #[test]
    fn test_duplicate_name_leaves_graph_unchanged() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("box1", "box", "/obj/geo1").unwrap();

        let err = graph.create_node("box1", "sphere", "/obj/geo2").unwrap_err();
        assert_eq!(err, GraphError::duplicate("box1"));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("box1").unwrap().node_type, "box");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut graph = NodeGraph::new(catalog());
        let err = graph.create_node("c1", "curve", "/obj/geo1").unwrap_err();
        assert_eq!(err, GraphError::unknown_type("curve"));
        assert!(graph.is_empty());
        assert!(graph.path_of("c1").is_none());
    }

    #[test]
    fn test_invalid_names() {
        let mut graph = NodeGraph::new(catalog());
        assert!(matches!(
            graph.create_node("", "box", "/obj/geo1"),
            Err(GraphError::InvalidName { .. })
        ));
        assert!(matches!(
            graph.create_node("a/b", "box", "/obj/geo1"),
            Err(GraphError::InvalidName { .. })
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_wire_records_source_path() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("box1", "box", "/obj/geo1").unwrap();
        graph.create_node("xform1", "xform", "/obj/geo1").unwrap();

        let status = graph.wire("box1", "xform1", 0).unwrap();
        assert_eq!(
            status,
            WireStatus::Bound(InputBinding::new(0, "/obj/geo1/box1"))
        );
        assert_eq!(
            graph.get("xform1").unwrap().inputs,
            vec![InputBinding::new(0, "/obj/geo1/box1")]
        );
    }

    #[test]
    fn test_wire_to_missing_target_fails() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("box1", "box", "/obj/geo1").unwrap();

        let err = graph.wire("box1", "xform1", 0).unwrap_err();
        assert_eq!(err, GraphError::unknown_node("xform1"));
        assert!(graph.get("box1").unwrap().inputs.is_empty());
        assert!(graph.pending_wires().is_empty());
    }

    #[test]
    fn test_strict_sources_reject_missing_source() {
        let policy = GraphPolicy {
            sources: SourceResolution::Strict,
            ..GraphPolicy::default()
        };
        let mut graph = NodeGraph::with_policy(catalog(), policy);
        graph.create_node("xform1", "xform", "/obj/geo1").unwrap();

        let err = graph.wire("box1", "xform1", 0).unwrap_err();
        assert_eq!(err, GraphError::unknown_node("box1"));
        assert!(graph.get("xform1").unwrap().inputs.is_empty());
    }

    #[test]
    fn test_deferred_source_resolves_on_creation() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("xform1", "xform", "/obj/geo1").unwrap();

        assert_eq!(graph.wire("box1", "xform1", 0).unwrap(), WireStatus::Deferred);
        assert_eq!(graph.pending_wires().len(), 1);
        assert!(graph.get("xform1").unwrap().inputs.is_empty());

        graph.create_node("box1", "box", "/obj/geo1").unwrap();
        assert!(graph.pending_wires().is_empty());
        assert_eq!(
            graph.get("xform1").unwrap().inputs,
            vec![InputBinding::new(0, "/obj/geo1/box1")]
        );
    }

    #[test]
    fn test_bound_wire_supersedes_pending_wire_on_same_index() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("a", "box", "/obj/geo1").unwrap();
        graph.create_node("m", "merge", "/obj/geo1").unwrap();

        assert_eq!(graph.wire("x", "m", 0).unwrap(), WireStatus::Deferred);
        graph.wire("a", "m", 0).unwrap();
        assert!(graph.pending_wires().is_empty());

        graph.create_node("x", "sphere", "/obj/geo1").unwrap();
        assert_eq!(
            graph.get("m").unwrap().inputs,
            vec![InputBinding::new(0, "/obj/geo1/a")]
        );
    }

    #[test]
    fn test_bound_wire_keeps_pending_wire_on_other_index() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("a", "box", "/obj/geo1").unwrap();
        graph.create_node("m", "merge", "/obj/geo1").unwrap();

        graph.wire("x", "m", 1).unwrap();
        graph.wire("a", "m", 0).unwrap();
        graph.create_node("x", "sphere", "/obj/geo1").unwrap();
        assert_eq!(
            graph.get("m").unwrap().inputs,
            vec![
                InputBinding::new(0, "/obj/geo1/a"),
                InputBinding::new(1, "/obj/geo1/x"),
            ]
        );
    }

    #[test]
    fn test_rewire_replaces_by_index() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("a", "box", "/obj/geo1").unwrap();
        graph.create_node("b", "sphere", "/obj/geo1").unwrap();
        graph.create_node("m", "merge", "/obj/geo1").unwrap();

        graph.wire("a", "m", 0).unwrap();
        graph.wire("b", "m", 0).unwrap();
        assert_eq!(
            graph.get("m").unwrap().inputs,
            vec![InputBinding::new(0, "/obj/geo1/b")]
        );
    }

    #[test]
    fn test_append_policy_keeps_both_records() {
        let policy = GraphPolicy {
            wiring: WiringPolicy::Append,
            ..GraphPolicy::default()
        };
        let mut graph = NodeGraph::with_policy(catalog(), policy);
        graph.create_node("a", "box", "/obj/geo1").unwrap();
        graph.create_node("b", "sphere", "/obj/geo1").unwrap();
        graph.create_node("m", "merge", "/obj/geo1").unwrap();

        graph.wire("a", "m", 0).unwrap();
        graph.wire("b", "m", 0).unwrap();
        assert_eq!(graph.get("m").unwrap().inputs.len(), 2);
    }

    #[test]
    fn test_set_parameter_is_idempotent() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("xform1", "xform", "/obj/geo1").unwrap();

        graph.set_parameter("xform1", "scale", 2.0).unwrap();
        let once = graph.snapshot();
        graph.set_parameter("xform1", "scale", 2.0).unwrap();
        assert_eq!(graph.snapshot(), once);

        graph.set_parameter("xform1", "scale", 3.0).unwrap();
        assert_eq!(
            graph.get("xform1").unwrap().parameters["scale"],
            ParamValue::Number(3.0)
        );
    }

    #[test]
    fn test_set_parameter_on_missing_node() {
        let mut graph = NodeGraph::new(catalog());
        let err = graph.set_parameter("ghost", "scale", 1.0).unwrap_err();
        assert_eq!(err, GraphError::unknown_node("ghost"));
    }

    #[test]
    fn test_snapshot_preserves_creation_order_and_reset_clears() {
        let mut graph = NodeGraph::new(catalog());
        graph.create_node("z", "box", "/obj/geo1").unwrap();
        graph.create_node("a", "null", "/obj/geo1").unwrap();
        graph.wire("missing", "a", 0).unwrap();

        let names: Vec<_> = graph.snapshot().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(graph.node_types().into_iter().collect::<Vec<_>>(), vec!["box", "null"]);

        graph.reset();
        assert!(graph.is_empty());
        assert!(graph.pending_wires().is_empty());
        assert!(graph.path_of("z").is_none());
        graph.create_node("z", "box", "/obj/geo1").unwrap();
    }

    #[test]
    fn test_load_replays_description() {
        let mut source = NodeGraph::new(catalog());
        source.create_node("box1", "box", "/obj/geo1").unwrap();
        source.create_node("xform1", "xform", "/obj/geo1").unwrap();
        source.wire("box1", "xform1", 0).unwrap();
        source.set_parameter("xform1", "scale", 2.0).unwrap();

        let (loaded, errors) = NodeGraph::load(catalog(), source.snapshot());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(loaded.snapshot(), source.snapshot());
    }

    #[test]
    fn test_load_reports_bad_entries() {
        let mut dangling = SceneNode::new("xform1", "xform", "/obj/geo1/xform1");
        dangling.inputs.push(InputBinding::new(0, "/obj/geo1/gone"));
        let nodes = vec![
            SceneNode::new("c1", "curve", "/obj/geo1/c1"),
            dangling,
            SceneNode::new("xform1", "xform", "/obj/geo2/xform1"),
        ];

        let (graph, errors) = NodeGraph::load(catalog(), nodes);
        assert_eq!(graph.len(), 1);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&GraphError::unknown_type("curve")));
        assert!(errors.contains(&GraphError::duplicate("xform1")));
        assert!(errors.contains(&GraphError::unknown_node("/obj/geo1/gone")));
    }
}
