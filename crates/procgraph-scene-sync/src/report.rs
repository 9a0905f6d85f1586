//! Reports for materialize and extract calls
//!
//! Synchronization is partial-success: problems with one node, parameter
//! or connection are recorded here and the call carries on.

use std::fmt;

use node_graph::SceneNode;

use crate::error::HostError;

/// Host call that was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOperation {
    SetParameter,
    Connect,
    Describe,
}

impl fmt::Display for HostOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetParameter => write!(f, "set parameter"),
            Self::Connect => write!(f, "connect"),
            Self::Describe => write!(f, "describe"),
        }
    }
}

/// A non-fatal problem found during synchronization
#[derive(Debug, Clone, PartialEq)]
pub enum SyncIssue {
    /// The host refused to create a node
    NodeRejected { path: String, error: HostError },
    /// The host node has no such parameter; the value was skipped
    MissingParameter { path: String, parameter: String },
    /// An input's source path does not resolve on the host
    UnresolvedSource {
        target: String,
        index: u32,
        source_path: String,
    },
    /// The node receiving inputs does not exist on the host
    MissingTarget { path: String, skipped: usize },
    /// The host refused some other operation
    HostRejection {
        operation: HostOperation,
        path: String,
        error: HostError,
    },
    /// An extracted input points outside the extracted nodes
    DanglingInput {
        node: String,
        index: u32,
        source_path: String,
    },
    /// Two extracted nodes share a name
    DuplicateName { name: String, path: String },
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeRejected { path, error } => {
                write!(f, "Could not create '{}': {}", path, error)
            }
            Self::MissingParameter { path, parameter } => {
                write!(f, "Node '{}' has no parameter '{}', skipped", path, parameter)
            }
            Self::UnresolvedSource {
                target,
                index,
                source_path,
            } => write!(
                f,
                "Could not find node at path '{}' for input {} of '{}'",
                source_path, index, target
            ),
            Self::MissingTarget { path, skipped } => write!(
                f,
                "Node '{}' is missing on the host, {} input(s) skipped",
                path, skipped
            ),
            Self::HostRejection {
                operation,
                path,
                error,
            } => write!(f, "Host refused {} on '{}': {}", operation, path, error),
            Self::DanglingInput {
                node,
                index,
                source_path,
            } => write!(
                f,
                "Input {} of '{}' comes from '{}' which was not extracted",
                index, node, source_path
            ),
            Self::DuplicateName { name, path } => {
                write!(f, "Node name '{}' at '{}' is already used", name, path)
            }
        }
    }
}

/// Outcome of a materialize call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub nodes_created: usize,
    pub parameters_set: usize,
    pub connections_made: usize,
    pub issues: Vec<SyncIssue>,
}

impl SyncReport {
    /// True when every node, parameter and connection was applied
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of an extract call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub nodes: Vec<SceneNode>,
    pub issues: Vec<SyncIssue>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
