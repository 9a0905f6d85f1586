//! Error types for the node graph

use thiserror::Error;

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors returned by graph mutations
///
/// Each of these is fatal to the single call that produced it. The graph is
/// left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node with this name (or its computed path) already exists
    #[error("Node '{name}' already exists")]
    DuplicateName { name: String },

    /// The node type is not registered in the type catalog
    #[error("Unknown node type '{node_type}'")]
    UnknownType { node_type: String },

    /// The referenced node does not exist in the graph
    #[error("Node '{name}' not found")]
    UnknownNode { name: String },

    /// The node name cannot be used to form a path
    #[error("Invalid node name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

impl GraphError {
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    pub fn unknown_type(node_type: impl Into<String>) -> Self {
        Self::UnknownType {
            node_type: node_type.into(),
        }
    }

    pub fn unknown_node(name: impl Into<String>) -> Self {
        Self::UnknownNode { name: name.into() }
    }
}

/// Errors raised while loading the type catalog
///
/// Unlike [`GraphError`], these are fatal to the whole process: nothing
/// downstream can validate a node without the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read type catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid JSON of the expected shape
    #[error("Failed to parse type catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog contains no node types
    #[error("Type catalog is empty")]
    Empty,

    /// The same node type appears twice
    #[error("Type catalog lists node type '{0}' more than once")]
    DuplicateType(String),
}
