//! Property-graph schema
//!
//! Two vertex labels and three edge labels:
//!
//! ```text
//! (HoudiniNode)-[:HAS_PARAMETER]->(Parameter)
//! (HoudiniNode)-[:CONNECTED_TO]->(HoudiniNode)    source -> target
//! (HoudiniNode)-[:CHILD_OF]->(HoudiniNode)        child -> parent
//! ```
//!
//! Node vertices are keyed by path, parameter vertices by their
//! [`ParameterKeying`] key.

use std::fmt;
use std::str::FromStr;

use node_graph::{ParamValue, SceneNode};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Vertex label for graph nodes
pub const NODE_LABEL: &str = "HoudiniNode";

/// Vertex label for parameter values
pub const PARAMETER_LABEL: &str = "Parameter";

/// A node vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVertex {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

impl From<&SceneNode> for NodeVertex {
    fn from(node: &SceneNode) -> Self {
        Self {
            path: node.path.clone(),
            name: node.name.clone(),
            node_type: node.node_type.clone(),
        }
    }
}

/// A parameter vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVertex {
    pub key: String,
    pub value: ParamValue,
}

/// Edge labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    HasParameter,
    ConnectedTo,
    ChildOf,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::HasParameter => "HAS_PARAMETER",
            EdgeKind::ConnectedTo => "CONNECTED_TO",
            EdgeKind::ChildOf => "CHILD_OF",
        }
    }

    /// Whether the edge ends at a parameter vertex rather than a node
    pub fn targets_parameter(&self) -> bool {
        matches!(self, EdgeKind::HasParameter)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HAS_PARAMETER" => Ok(EdgeKind::HasParameter),
            "CONNECTED_TO" => Ok(EdgeKind::ConnectedTo),
            "CHILD_OF" => Ok(EdgeKind::ChildOf),
            other => Err(StoreError::UnknownEdgeKind(other.to_string())),
        }
    }
}

/// A directed, labeled edge between two vertex keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(kind: EdgeKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn connected(source_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self::new(EdgeKind::ConnectedTo, source_path, target_path)
    }

    pub fn child_of(child_path: impl Into<String>, parent_path: impl Into<String>) -> Self {
        Self::new(EdgeKind::ChildOf, child_path, parent_path)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[:{}]->({})", self.from, self.kind, self.to)
    }
}

/// How parameter vertices are keyed
///
/// `Shared` keys by parameter name alone, so every node with a `scale`
/// parameter points at the same vertex and the last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKeying {
    #[default]
    PerNode,
    Shared,
}

impl ParameterKeying {
    pub fn key(&self, node_path: &str, parameter: &str) -> String {
        match self {
            ParameterKeying::PerNode => format!("{}#{}", node_path, parameter),
            ParameterKeying::Shared => parameter.to_string(),
        }
    }
}

/// Vertex and edge counts of a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub nodes: usize,
    pub parameters: usize,
    pub edges: usize,
}
