//! Graph-database projection for procgraph node graphs
//!
//! Mirrors node graph snapshots into a labeled property graph so a caller
//! can query structure and lineage:
//!
//! - `HoudiniNode` vertices keyed by path
//! - `Parameter` vertices keyed per node (or shared by name)
//! - `HAS_PARAMETER`, `CONNECTED_TO` and `CHILD_OF` edges
//!
//! Storage sits behind the async [`GraphStore`] trait, with an in-memory
//! store and a SQLite store provided. [`GraphProjector`] performs the
//! two-phase upsert.

pub mod error;
pub mod memory;
pub mod projector;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryGraphStore;
pub use projector::{GraphProjector, ProjectionFailure, ProjectionReport};
pub use schema::{
    Edge, EdgeKind, NodeVertex, ParameterKeying, ParameterVertex, StoreStats, NODE_LABEL,
    PARAMETER_LABEL,
};
pub use sqlite::SqliteGraphStore;
pub use store::GraphStore;
