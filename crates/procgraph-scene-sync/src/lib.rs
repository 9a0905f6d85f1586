//! Scene synchronization for procgraph node graphs
//!
//! Translates between [`node_graph::SceneNode`] snapshots and a live scene
//! host: `materialize` builds the snapshot in the host, `extract` reads a
//! host scene back into a snapshot. Both are partial-success operations
//! that report what they skipped instead of failing.
//!
//! The host is an external collaborator described by the [`SceneHost`]
//! trait. [`MemorySceneHost`] is a complete in-memory implementation.

pub mod coerce;
pub mod error;
mod extract;
pub mod host;
mod materialize;
pub mod memory;
pub mod report;
pub mod synchronizer;

pub use coerce::coerce;
pub use error::{HostError, Result, SyncError};
pub use host::{HostNode, HostValue, SceneHost};
pub use memory::{MemoryHandle, MemorySceneHost};
pub use report::{Extraction, HostOperation, SyncIssue, SyncReport};
pub use synchronizer::{SceneSynchronizer, SyncOptions, DEFAULT_EXTRACT_ROOT};
