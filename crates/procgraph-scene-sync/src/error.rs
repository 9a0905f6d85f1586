//! Error types for scene synchronization

use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// A scene host refused an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No node exists at the given path
    #[error("No node at '{0}'")]
    NotFound(String),

    /// The host cannot create nodes of this type here
    #[error("Cannot create node of type '{node_type}' under '{parent}'")]
    InvalidType { parent: String, node_type: String },

    /// A node already occupies the requested path
    #[error("A node already exists at '{0}'")]
    NameInUse(String),

    /// The node has no parameter with this name
    #[error("Node '{node}' has no parameter '{parameter}'")]
    UnknownParameter { node: String, parameter: String },

    /// The connection is not allowed (e.g. it would form a cycle)
    #[error("Cannot connect '{source_path}' to input {index} of '{target}': {reason}")]
    InvalidConnection {
        target: String,
        index: u32,
        source_path: String,
        reason: String,
    },
}

/// Errors that stop a synchronization call before it touches the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The wiring contains a cycle; nothing was materialized
    #[error("Graph wiring contains a cycle")]
    CycleDetected,
}
