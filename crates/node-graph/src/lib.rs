//! Node Graph - procedural scene graph model for procgraph
//!
//! This crate holds the canonical in-memory representation of a procedural
//! node network and the operations callers use to build it:
//!
//! - Typed operator nodes with unique names and hierarchical paths
//! - Input wiring by index, with explicit replace/append policy
//! - Per-node parameter values as a closed tagged union
//! - A read-only type catalog for validating node types and parameters
//! - Structural validation (dangling inputs, cycles, duplicates)
//!
//! # Architecture
//!
//! - `NodeGraph`: the model, owning all mutation invariants
//! - `BuildSession`: the mutation API, one exclusive graph per session
//! - `TypeCatalog`: node type vocabulary and parameter schemas
//! - `EventSink`: generic event streaming for accepted mutations
//!
//! # Example
//!
//! ```ignore
//! use node_graph::{BuildSession, TypeCatalog};
//!
//! let catalog = Arc::new(TypeCatalog::load("node_types.json")?);
//! let mut session = BuildSession::new(catalog);
//! session.create_node("box1", "box", "/obj/geo1")?;
//! let output = session.finish();
//! ```

pub mod catalog;
pub mod error;
pub mod events;
pub mod graph;
pub mod paths;
pub mod session;
pub mod types;
pub mod validation;
pub mod value;

// Re-export key types
pub use catalog::{ParamKind, ParameterTemplate, TypeCatalog, TypeEntry};
pub use error::{CatalogError, GraphError, Result};
pub use events::{CollectingEventSink, EventSink, GraphEvent, NullEventSink};
pub use graph::{GraphPolicy, NodeGraph, PendingWire, SourceResolution, WireStatus, WiringPolicy};
pub use paths::PathRegistry;
pub use session::{Ack, Briefing, BuildSession, GraphOperation, OperationOutcome, SessionOutput};
pub use types::{InputBinding, NodeName, NodePath, SceneNode};
pub use validation::{detect_cycle, validate_nodes, ValidationError};
pub use value::ParamValue;
