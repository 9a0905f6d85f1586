//! Scene host contract
//!
//! A scene host is the live application scene nodes are materialized into
//! and extracted from. Hosts are single-threaded and stateful, so every
//! mutating call takes `&mut self`.

use indexmap::IndexMap;
use node_graph::ParamValue;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Identity of a node as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub path: String,
}

/// A parameter value in the host's own representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HostValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    String(String),
    FloatTuple(Vec<f64>),
    IntTuple(Vec<i64>),
    /// Anything else the host can evaluate (ramps, keyframes, data blocks)
    Json(serde_json::Value),
}

impl From<&ParamValue> for HostValue {
    fn from(value: &ParamValue) -> Self {
        match value {
            ParamValue::Number(n) => Self::Float(*n),
            ParamValue::Boolean(b) => Self::Bool(*b),
            ParamValue::Text(s) => Self::String(s.clone()),
            ParamValue::Tuple(values) => Self::FloatTuple(values.clone()),
        }
    }
}

/// Minimal capabilities a scene host must provide
pub trait SceneHost {
    /// Handle to a live node
    type Handle: Clone + std::fmt::Debug;

    /// Create a node of `node_type` named `name` under `parent`
    fn create_child(
        &mut self,
        parent: &str,
        node_type: &str,
        name: &str,
    ) -> Result<Self::Handle, HostError>;

    /// Look up a node by path
    fn resolve(&self, path: &str) -> Option<Self::Handle>;

    /// Set a parameter on a node
    fn set_parameter(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: &ParamValue,
    ) -> Result<(), HostError>;

    /// Connect the output of `source` into input `input_index` of `node`
    fn connect(
        &mut self,
        node: &Self::Handle,
        input_index: u32,
        source: &Self::Handle,
    ) -> Result<(), HostError>;

    /// Direct children of the node at `path`, in host order
    fn enumerate_children(&self, path: &str) -> Vec<Self::Handle>;

    /// Name, type and path of a node
    fn describe(&self, node: &Self::Handle) -> Result<HostNode, HostError>;

    /// Current value of every evaluable parameter
    fn read_parameters(&self, node: &Self::Handle) -> IndexMap<String, HostValue>;

    /// Input slots in index order; disconnected slots are `None`
    fn read_inputs(&self, node: &Self::Handle) -> Vec<(u32, Option<String>)>;
}
