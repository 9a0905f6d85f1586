//! Structural validation for node graph snapshots
//!
//! Checks that a description is well formed: unique names and paths,
//! resolvable input sources, single binding per input index, known types
//! and parameters, and no cycles. Nothing here judges whether a network
//! would actually cook.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::TypeCatalog;
use crate::types::SceneNode;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cycle detected in the wiring
    CycleDetected,
    /// Two nodes share a name
    DuplicateName { name: String },
    /// Two nodes share a path
    DuplicatePath { path: String },
    /// An input references a path that is not in the graph
    DanglingInput {
        node: String,
        index: u32,
        source_path: String,
    },
    /// More than one source is bound to the same input index
    DuplicateInputIndex { node: String, index: u32 },
    /// A node has a type that is not in the catalog
    UnknownNodeType { node: String, node_type: String },
    /// A parameter is not declared for the node's type
    UnknownParameter {
        node: String,
        node_type: String,
        parameter: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
            Self::DuplicateName { name } => write!(f, "Node name '{}' is used more than once", name),
            Self::DuplicatePath { path } => write!(f, "Node path '{}' is used more than once", path),
            Self::DanglingInput {
                node,
                index,
                source_path,
            } => {
                write!(
                    f,
                    "Input {} of node '{}' references missing node '{}'",
                    index, node, source_path
                )
            }
            Self::DuplicateInputIndex { node, index } => {
                write!(f, "Input {} of node '{}' has more than one source", index, node)
            }
            Self::UnknownNodeType { node, node_type } => {
                write!(f, "Unknown node type '{}' for node '{}'", node_type, node)
            }
            Self::UnknownParameter {
                node,
                node_type,
                parameter,
            } => {
                write!(
                    f,
                    "Parameter '{}' on node '{}' is not declared for type '{}'",
                    parameter, node, node_type
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a graph snapshot
///
/// Returns all validation errors found (not just the first).
/// Pass a catalog to enable type and parameter checks.
pub fn validate_nodes(nodes: &[SceneNode], catalog: Option<&TypeCatalog>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_identity(nodes, &mut errors);
    validate_inputs(nodes, &mut errors);
    if detect_cycle(nodes) {
        errors.push(ValidationError::CycleDetected);
    }

    if let Some(catalog) = catalog {
        validate_types(nodes, catalog, &mut errors);
    }

    errors
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Edges run from each input's source path to the node that consumes it.
/// Inputs whose source is not in `nodes` are ignored.
pub fn detect_cycle(nodes: &[SceneNode]) -> bool {
    let index_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.path.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; nodes.len()];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (target, node) in nodes.iter().enumerate() {
        for binding in &node.inputs {
            if let Some(&source) = index_of.get(binding.path.as_str()) {
                outgoing[source].push(target);
                in_degree[target] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut visited = 0;
    while let Some(source) = queue.pop_front() {
        visited += 1;
        for &target in &outgoing[source] {
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                queue.push_back(target);
            }
        }
    }

    visited < nodes.len()
}

/// Check that names and paths are unique
fn validate_identity(nodes: &[SceneNode], errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for node in nodes {
        if !names.insert(node.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                name: node.name.clone(),
            });
        }
        if !paths.insert(node.path.as_str()) {
            errors.push(ValidationError::DuplicatePath {
                path: node.path.clone(),
            });
        }
    }
}

/// Check that every input resolves and no index is bound twice
fn validate_inputs(nodes: &[SceneNode], errors: &mut Vec<ValidationError>) {
    let paths: HashSet<&str> = nodes.iter().map(|n| n.path.as_str()).collect();

    for node in nodes {
        let mut seen = HashSet::new();
        for binding in &node.inputs {
            if !paths.contains(binding.path.as_str()) {
                errors.push(ValidationError::DanglingInput {
                    node: node.name.clone(),
                    index: binding.index,
                    source_path: binding.path.clone(),
                });
            }
            if !seen.insert(binding.index) {
                errors.push(ValidationError::DuplicateInputIndex {
                    node: node.name.clone(),
                    index: binding.index,
                });
            }
        }
    }
}

/// Check node types and parameter names against the catalog
fn validate_types(nodes: &[SceneNode], catalog: &TypeCatalog, errors: &mut Vec<ValidationError>) {
    for node in nodes {
        if !catalog.contains(&node.node_type) {
            errors.push(ValidationError::UnknownNodeType {
                node: node.name.clone(),
                node_type: node.node_type.clone(),
            });
            continue;
        }
        for parameter in node.parameters.keys() {
            if !catalog.accepts_parameter(&node.node_type, parameter) {
                errors.push(ValidationError::UnknownParameter {
                    node: node.name.clone(),
                    node_type: node.node_type.clone(),
                    parameter: parameter.clone(),
                });
            }
        }
    }
}
