//! Error types for graph storage

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a graph store
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An edge endpoint has not been upserted
    #[error("Vertex '{0}' does not exist")]
    MissingVertex(String),

    /// A stored edge has a label this version does not know
    #[error("Unknown edge type '{0}'")]
    UnknownEdgeKind(String),

    /// The blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),
}
