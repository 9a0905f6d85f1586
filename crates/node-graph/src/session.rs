//! Build sessions
//!
//! A `BuildSession` is the mutation surface callers talk to. It owns one
//! [`NodeGraph`] exclusively for the length of a build, answers every
//! operation with an explicit acknowledgement or error, and hands the
//! finished graph off with [`BuildSession::finish`], which also clears it
//! for the next build.
//!
//! ```ignore
//! let mut session = BuildSession::new(catalog);
//! session.create_node("box1", "box", "/obj/geo1")?;
//! session.create_node("xform1", "xform", "/obj/geo1")?;
//! session.wire("box1", "xform1", 0)?;
//! session.set_parameter("xform1", "scale", 2.0)?;
//! let output = session.finish();
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{ParameterTemplate, TypeCatalog};
use crate::error::{GraphError, Result};
use crate::events::{EventSink, GraphEvent, NullEventSink};
use crate::graph::{GraphPolicy, NodeGraph, PendingWire, WireStatus};
use crate::types::SceneNode;
use crate::value::ParamValue;

/// One graph operation in serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphOperation {
    CreateNode {
        name: String,
        #[serde(rename = "type")]
        node_type: String,
        location: String,
    },
    Wire {
        source: String,
        #[serde(default)]
        input_index: u32,
        target: String,
    },
    SetParameter {
        node: String,
        parameter: String,
        value: serde_json::Value,
    },
}

/// Acknowledgement of an accepted operation
#[derive(Debug, Clone, PartialEq)]
pub enum Ack {
    Created {
        name: String,
        node_type: String,
        path: String,
    },
    Wired {
        source: String,
        target: String,
        input_index: u32,
        deferred: bool,
    },
    ParameterSet {
        node: String,
        parameter: String,
        value: ParamValue,
    },
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created {
                name,
                node_type,
                path,
            } => write!(f, "Node '{}' of type '{}' created at '{}'.", name, node_type, path),
            Self::Wired {
                source,
                target,
                input_index,
                deferred: false,
            } => write!(f, "Wired {} to {} at input index {}.", source, target, input_index),
            Self::Wired {
                source,
                target,
                input_index,
                deferred: true,
            } => write!(
                f,
                "Wire {} to {} at input index {} will be made once '{}' exists.",
                source, target, input_index, source
            ),
            Self::ParameterSet {
                node,
                parameter,
                value,
            } => write!(
                f,
                "Updated parameter '{}' of node '{}' to {}.",
                parameter, node, value
            ),
        }
    }
}

/// Outcome of one operation in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub operation: GraphOperation,
    pub result: std::result::Result<Ack, GraphError>,
}

impl OperationOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Message to hand back to the caller
    pub fn message(&self) -> String {
        match &self.result {
            Ok(ack) => ack.to_string(),
            Err(e) => e.to_string(),
        }
    }
}

/// What a caller needs to know to keep building
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Briefing {
    /// Every node type the catalog allows
    pub allowed_types: Vec<String>,
    /// Current graph structure
    pub graph_structure: Vec<SceneNode>,
    /// Parameter schemas for the types currently in the graph
    pub allowed_parameters: IndexMap<String, Vec<ParameterTemplate>>,
    /// Wires still waiting for their source
    pub pending_wires: Vec<PendingWire>,
}

/// What a finished session hands off
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    /// Final graph snapshot
    pub nodes: Vec<SceneNode>,
    /// Wires whose source was never created; absent from `nodes`
    pub unresolved: Vec<PendingWire>,
}

impl SessionOutput {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Exclusive owner of one graph under construction
pub struct BuildSession {
    session_id: String,
    graph: NodeGraph,
    events: Arc<dyn EventSink>,
}

impl BuildSession {
    /// Create a session with default policies and no event consumer
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self::with_policy(catalog, GraphPolicy::default())
    }

    pub fn with_policy(catalog: Arc<TypeCatalog>, policy: GraphPolicy) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            graph: NodeGraph::with_policy(catalog, policy),
            events: Arc::new(NullEventSink),
        }
    }

    /// Route session events to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read access to the graph under construction
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn create_node(&mut self, name: &str, node_type: &str, location: &str) -> Result<Ack> {
        let path = self
            .graph
            .create_node(name, node_type, location)
            .inspect_err(|e| self.log_rejection("create_node", e))?;

        self.emit(GraphEvent::NodeCreated {
            session_id: self.session_id.clone(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            path: path.clone(),
        });
        Ok(Ack::Created {
            name: name.to_string(),
            node_type: node_type.to_string(),
            path,
        })
    }

    pub fn wire(&mut self, source: &str, target: &str, input_index: u32) -> Result<Ack> {
        let status = self
            .graph
            .wire(source, target, input_index)
            .inspect_err(|e| self.log_rejection("wire", e))?;
        let deferred = status == WireStatus::Deferred;

        self.emit(GraphEvent::NodesWired {
            session_id: self.session_id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            input_index,
            deferred,
        });
        Ok(Ack::Wired {
            source: source.to_string(),
            target: target.to_string(),
            input_index,
            deferred,
        })
    }

    pub fn set_parameter(
        &mut self,
        node: &str,
        parameter: &str,
        value: impl Into<ParamValue>,
    ) -> Result<Ack> {
        let value = value.into();
        self.graph
            .set_parameter(node, parameter, value.clone())
            .inspect_err(|e| self.log_rejection("set_parameter", e))?;

        self.emit(GraphEvent::ParameterSet {
            session_id: self.session_id.clone(),
            node: node.to_string(),
            parameter: parameter.to_string(),
            value: value.clone(),
        });
        Ok(Ack::ParameterSet {
            node: node.to_string(),
            parameter: parameter.to_string(),
            value,
        })
    }

    /// Apply one serialized operation
    pub fn apply(&mut self, operation: &GraphOperation) -> Result<Ack> {
        match operation {
            GraphOperation::CreateNode {
                name,
                node_type,
                location,
            } => self.create_node(name, node_type, location),
            GraphOperation::Wire {
                source,
                input_index,
                target,
            } => self.wire(source, target, *input_index),
            GraphOperation::SetParameter {
                node,
                parameter,
                value,
            } => self.set_parameter(node, parameter, ParamValue::from_json(value)),
        }
    }

    /// Apply a batch, continuing past failures
    pub fn apply_all(
        &mut self,
        operations: impl IntoIterator<Item = GraphOperation>,
    ) -> Vec<OperationOutcome> {
        operations
            .into_iter()
            .map(|operation| {
                let result = self.apply(&operation);
                OperationOutcome { operation, result }
            })
            .collect()
    }

    /// Current vocabulary, structure and relevant parameter schemas
    pub fn briefing(&self) -> Briefing {
        let catalog = self.graph.catalog();
        Briefing {
            allowed_types: catalog
                .allowed_types()
                .into_iter()
                .map(str::to_string)
                .collect(),
            graph_structure: self.graph.snapshot(),
            allowed_parameters: catalog.parameters_for(self.graph.node_types()),
            pending_wires: self.graph.pending_wires().to_vec(),
        }
    }

    /// Current graph state without ending the session
    pub fn snapshot(&self) -> Vec<SceneNode> {
        self.graph.snapshot()
    }

    /// Hand off the graph and clear the session for the next build
    ///
    /// Wires still waiting for their source are returned alongside the
    /// snapshot rather than dropped.
    pub fn finish(&mut self) -> SessionOutput {
        let nodes = self.graph.snapshot();
        let unresolved = self.graph.pending_wires().to_vec();
        if !unresolved.is_empty() {
            log::warn!(
                "Session {} finished with {} unresolved wire(s)",
                self.session_id,
                unresolved.len()
            );
        }
        self.graph.reset();

        log::info!(
            "Session {} finished with {} node(s)",
            self.session_id,
            nodes.len()
        );
        self.emit(GraphEvent::SessionFinished {
            session_id: self.session_id.clone(),
            node_count: nodes.len(),
        });
        self.session_id = uuid::Uuid::new_v4().to_string();
        SessionOutput { nodes, unresolved }
    }

    fn emit(&self, event: GraphEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver graph event: {}", e);
        }
    }

    fn log_rejection(&self, operation: &str, error: &GraphError) {
        log::debug!(
            "Session {} rejected {}: {}",
            self.session_id,
            operation,
            error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeEntry;
    use crate::events::CollectingEventSink;
    use crate::types::InputBinding;
    use serde_json::json;

    fn catalog() -> Arc<TypeCatalog> {
        Arc::new(
            TypeCatalog::from_entries([
                TypeEntry::new("box", vec![ParameterTemplate::named("sizex")]),
                TypeEntry::new("xform", vec![ParameterTemplate::named("scale")]),
                TypeEntry::new("null", vec![]),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_box_xform_scenario() {
        let mut session = BuildSession::new(catalog());
        session.create_node("box1", "box", "/obj/geo1").unwrap();
        session.create_node("xform1", "xform", "/obj/geo1").unwrap();
        session.wire("box1", "xform1", 0).unwrap();
        session.set_parameter("xform1", "scale", 2).unwrap();

        let nodes = session.snapshot();
        let xform = nodes.iter().find(|n| n.name == "xform1").unwrap();
        assert_eq!(xform.inputs, vec![InputBinding::new(0, "/obj/geo1/box1")]);
        assert_eq!(xform.parameters.len(), 1);
        assert_eq!(xform.parameters["scale"], ParamValue::Number(2.0));
    }

    #[test]
    fn test_ack_messages() {
        let mut session = BuildSession::new(catalog());
        let ack = session.create_node("box1", "box", "/obj/geo1").unwrap();
        assert_eq!(
            ack.to_string(),
            "Node 'box1' of type 'box' created at '/obj/geo1/box1'."
        );
        session.create_node("xform1", "xform", "/obj/geo1").unwrap();
        let ack = session.wire("box1", "xform1", 0).unwrap();
        assert_eq!(ack.to_string(), "Wired box1 to xform1 at input index 0.");
        let ack = session.set_parameter("xform1", "scale", 2).unwrap();
        assert_eq!(
            ack.to_string(),
            "Updated parameter 'scale' of node 'xform1' to 2."
        );
    }

    #[test]
    fn test_apply_all_continues_past_failures() {
        let operations: Vec<GraphOperation> = serde_json::from_value(json!([
            {"op": "create_node", "name": "box1", "type": "box", "location": "/obj/geo1"},
            {"op": "create_node", "name": "box1", "type": "box", "location": "/obj/geo1"},
            {"op": "create_node", "name": "c1", "type": "curve", "location": "/obj/geo1"},
            {"op": "create_node", "name": "xform1", "type": "xform", "location": "/obj/geo1"},
            {"op": "wire", "source": "box1", "target": "xform1"},
            {"op": "set_parameter", "node": "ghost", "parameter": "scale", "value": 1},
            {"op": "set_parameter", "node": "xform1", "parameter": "scale", "value": [1, 2, 3]}
        ]))
        .unwrap();

        let mut session = BuildSession::new(catalog());
        let outcomes = session.apply_all(operations);
        let ok: Vec<bool> = outcomes.iter().map(OperationOutcome::is_ok).collect();
        assert_eq!(ok, vec![true, false, false, true, true, false, true]);
        assert_eq!(outcomes[1].message(), "Node 'box1' already exists");
        assert_eq!(outcomes[2].message(), "Unknown node type 'curve'");
        assert_eq!(outcomes[5].message(), "Node 'ghost' not found");

        let graph = session.graph();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.get("xform1").unwrap().parameters["scale"],
            ParamValue::Tuple(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_wire_before_source_exists() {
        let mut session = BuildSession::new(catalog());
        session.create_node("xform1", "xform", "/obj/geo1").unwrap();
        let ack = session.wire("box1", "xform1", 0).unwrap();
        assert!(matches!(ack, Ack::Wired { deferred: true, .. }));

        session.create_node("box1", "box", "/obj/geo1").unwrap();
        let nodes = session.snapshot();
        assert_eq!(nodes[0].inputs, vec![InputBinding::new(0, "/obj/geo1/box1")]);
    }

    #[test]
    fn test_briefing_scopes_parameters_to_types_in_play() {
        let mut session = BuildSession::new(catalog());
        session.create_node("xform1", "xform", "/obj/geo1").unwrap();

        let briefing = session.briefing();
        assert_eq!(briefing.allowed_types, vec!["box", "null", "xform"]);
        assert_eq!(briefing.graph_structure.len(), 1);
        assert_eq!(briefing.allowed_parameters.len(), 1);
        assert!(briefing.allowed_parameters.contains_key("xform"));
    }

    #[test]
    fn test_finish_hands_off_and_resets() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut session = BuildSession::new(catalog()).with_event_sink(sink.clone());
        let first_id = session.session_id().to_string();

        session.create_node("box1", "box", "/obj/geo1").unwrap();
        let _ = session.create_node("box1", "box", "/obj/geo1");
        let output = session.finish();

        assert_eq!(output.nodes.len(), 1);
        assert!(output.is_complete());
        assert!(session.graph().is_empty());
        assert_ne!(session.session_id(), first_id);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GraphEvent::NodeCreated { .. }));
        assert_eq!(
            events[1],
            GraphEvent::SessionFinished {
                session_id: first_id,
                node_count: 1
            }
        );

        session.create_node("box1", "box", "/obj/geo1").unwrap();
    }

    #[test]
    fn test_finish_returns_unresolved_wires() {
        let mut session = BuildSession::new(catalog());
        session.create_node("xform1", "xform", "/obj/geo1").unwrap();
        session.wire("ghost", "xform1", 0).unwrap();
        session.wire("box1", "xform1", 1).unwrap();
        session.create_node("box1", "box", "/obj/geo1").unwrap();

        let output = session.finish();
        assert!(!output.is_complete());
        assert_eq!(
            output.unresolved,
            vec![PendingWire {
                source: "ghost".into(),
                target: "xform1".into(),
                input_index: 0,
            }]
        );
        assert_eq!(
            output.unresolved[0].to_string(),
            "ghost -> xform1[0] (source never created)"
        );
        let xform = output.nodes.iter().find(|n| n.name == "xform1").unwrap();
        assert_eq!(xform.inputs.len(), 1);
        assert_eq!(xform.inputs[0].path, "/obj/geo1/box1");

        assert!(session.finish().unresolved.is_empty());
    }
}
