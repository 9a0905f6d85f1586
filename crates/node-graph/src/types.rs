//! Core types for node graphs
//!
//! These types make up the structural description exchanged with callers,
//! the scene synchronizer and the graph-database projector: an ordered list
//! of nodes, each with its type, path, input wiring and parameter values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::paths;
use crate::value::ParamValue;

/// Unique name of a node within a graph
pub type NodeName = String;

/// Hierarchical location of a node (e.g. `/obj/geo1/box1`)
pub type NodePath = String;

/// One wiring record: the node at `path` feeds input `index`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputBinding {
    /// Input port index on the receiving node
    pub index: u32,
    /// Path of the source node
    pub path: NodePath,
}

impl InputBinding {
    pub fn new(index: u32, path: impl Into<String>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }
}

/// A node in the structural description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Unique name within the graph
    pub name: NodeName,
    /// Operator type (must be in the type catalog)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Hierarchical path, assigned once at creation
    pub path: NodePath,
    /// Connected inputs, ordered by index
    #[serde(default)]
    pub inputs: Vec<InputBinding>,
    /// Parameter values by name
    #[serde(default)]
    pub parameters: IndexMap<String, ParamValue>,
}

impl SceneNode {
    /// Create a node with no inputs or parameters
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            path: path.into(),
            inputs: Vec::new(),
            parameters: IndexMap::new(),
        }
    }

    /// Location this node lives under
    pub fn parent_location(&self) -> Option<&str> {
        paths::parent_of(&self.path)
    }

    /// Input binding at a given index, if connected
    pub fn input(&self, index: u32) -> Option<&InputBinding> {
        self.inputs.iter().find(|b| b.index == index)
    }

    /// Indices of all connected inputs
    pub fn connected_indices(&self) -> Vec<u32> {
        self.inputs.iter().map(|b| b.index).collect()
    }

    /// Insert a binding, keeping the list ordered by index
    ///
    /// When `replace` is set an existing binding at the same index is
    /// dropped first; otherwise the new binding goes after any existing
    /// bindings for that index.
    pub(crate) fn bind_input(&mut self, binding: InputBinding, replace: bool) {
        if replace {
            self.inputs.retain(|b| b.index != binding.index);
        }
        let pos = self
            .inputs
            .iter()
            .position(|b| b.index > binding.index)
            .unwrap_or(self.inputs.len());
        self.inputs.insert(pos, binding);
    }
}
