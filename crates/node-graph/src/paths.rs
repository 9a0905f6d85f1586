//! Path registry
//!
//! Maps node names to their hierarchical paths and back. A path is
//! assigned exactly once, when the node is created, and never changes.

use std::collections::HashMap;

use crate::error::{GraphError, Result};

/// Path separator used by the scene hierarchy
pub const SEPARATOR: char = '/';

/// Join a parent location and a node name into a path
pub fn join(parent: &str, name: &str) -> String {
    format!("{}{}{}", parent.trim_end_matches(SEPARATOR), SEPARATOR, name)
}

/// Parent location of a path, or `None` for a top-level path
pub fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(0) | None => None,
        Some(pos) => Some(&trimmed[..pos]),
    }
}

/// Last segment of a path
pub fn leaf_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Bidirectional name/path index
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    by_name: HashMap<String, String>,
    by_path: HashMap<String, String>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a path to `name` under `parent`
    ///
    /// Fails if the name or the computed path is already taken; the
    /// registry is unchanged on failure.
    pub fn register(&mut self, name: &str, parent: &str) -> Result<String> {
        let path = join(parent, name);
        self.insert(name, &path)?;
        Ok(path)
    }

    /// Record an already-computed path for `name`
    pub fn insert(&mut self, name: &str, path: &str) -> Result<()> {
        if self.by_name.contains_key(name) || self.by_path.contains_key(path) {
            return Err(GraphError::duplicate(name));
        }
        self.by_name.insert(name.to_string(), path.to_string());
        self.by_path.insert(path.to_string(), name.to_string());
        Ok(())
    }

    /// Path of a named node
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Name of the node at a path
    pub fn name_for(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
        self.by_path.clear();
    }
}
