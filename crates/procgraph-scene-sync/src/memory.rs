//! In-memory scene host
//!
//! A self-contained host that behaves like a minimal procedural scene:
//! nodes live in a hierarchy under `/`, have named parameters and indexed
//! inputs, and connections that would form a cycle are refused. Used for
//! round-trip checks and anywhere a real host application is unavailable.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use node_graph::paths;
use node_graph::{ParamValue, TypeCatalog};

use crate::error::HostError;
use crate::host::{HostNode, HostValue, SceneHost};

/// Handle to a node in a [`MemorySceneHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle(usize);

#[derive(Debug, Clone)]
struct HostRecord {
    name: String,
    node_type: String,
    path: String,
    children: Vec<usize>,
    parameters: IndexMap<String, HostValue>,
    inputs: Vec<Option<usize>>,
    container: bool,
}

/// Scene host backed by an in-memory node arena
#[derive(Debug, Clone)]
pub struct MemorySceneHost {
    records: Vec<HostRecord>,
    by_path: HashMap<String, usize>,
    catalog: Option<Arc<TypeCatalog>>,
}

const ROOT: usize = 0;

/// Highest input count a node accepts; larger indices are refused
pub const MAX_INPUTS: u32 = 1024;

impl MemorySceneHost {
    /// A host holding only the root
    pub fn empty() -> Self {
        let root = HostRecord {
            name: String::new(),
            node_type: "root".to_string(),
            path: "/".to_string(),
            children: Vec::new(),
            parameters: IndexMap::new(),
            inputs: Vec::new(),
            container: true,
        };
        Self {
            records: vec![root],
            by_path: HashMap::from([("/".to_string(), ROOT)]),
            catalog: None,
        }
    }

    /// A host with the standard `/obj/geo1` geometry container
    pub fn new() -> Self {
        let mut host = Self::empty();
        host.add_container("/obj", "obj");
        host.add_container("/obj/geo1", "geo");
        host
    }

    /// Restrict node types and parameter names to those in `catalog`
    pub fn with_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Ensure a container exists at `path`, creating missing ancestors
    ///
    /// Containers are not checked against the catalog.
    pub fn add_container(&mut self, path: &str, node_type: &str) -> MemoryHandle {
        if let Some(&index) = self.by_path.get(path) {
            return MemoryHandle(index);
        }
        let parent = match paths::parent_of(path) {
            Some(parent) => self.add_container(parent, "subnet").0,
            None => ROOT,
        };
        let index = self.insert(parent, paths::leaf_name(path), node_type);
        self.records[index].container = true;
        MemoryHandle(index)
    }

    /// Write a parameter in host-native form, bypassing schema checks
    pub fn write_native_parameter(&mut self, node: MemoryHandle, name: &str, value: HostValue) {
        if let Some(record) = self.records.get_mut(node.0) {
            record.parameters.insert(name.to_string(), value);
        }
    }

    /// Number of non-container nodes
    pub fn node_count(&self) -> usize {
        self.records.iter().filter(|r| !r.container).count()
    }

    fn lookup(&self, path: &str) -> Option<usize> {
        let key = if path.is_empty() { "/" } else { path };
        self.by_path.get(key).copied()
    }

    fn record(&self, handle: &MemoryHandle) -> Result<&HostRecord, HostError> {
        self.records
            .get(handle.0)
            .ok_or_else(|| HostError::NotFound(format!("#{}", handle.0)))
    }

    fn insert(&mut self, parent: usize, name: &str, node_type: &str) -> usize {
        let path = paths::join(&self.records[parent].path, name);
        let index = self.records.len();
        self.records.push(HostRecord {
            name: name.to_string(),
            node_type: node_type.to_string(),
            path: path.clone(),
            children: Vec::new(),
            parameters: IndexMap::new(),
            inputs: Vec::new(),
            container: false,
        });
        self.records[parent].children.push(index);
        self.by_path.insert(path, index);
        index
    }

    /// Whether `node` is `ancestor` or fed (transitively) by it
    fn is_upstream(&self, ancestor: usize, node: usize) -> bool {
        let mut stack = vec![node];
        let mut seen = vec![false; self.records.len()];
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if std::mem::replace(&mut seen[current], true) {
                continue;
            }
            stack.extend(self.records[current].inputs.iter().flatten().copied());
        }
        false
    }
}

impl Default for MemorySceneHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost for MemorySceneHost {
    type Handle = MemoryHandle;

    fn create_child(
        &mut self,
        parent: &str,
        node_type: &str,
        name: &str,
    ) -> Result<MemoryHandle, HostError> {
        let parent_index = self
            .lookup(parent)
            .ok_or_else(|| HostError::NotFound(parent.to_string()))?;

        if let Some(catalog) = &self.catalog {
            if !catalog.contains(node_type) {
                return Err(HostError::InvalidType {
                    parent: parent.to_string(),
                    node_type: node_type.to_string(),
                });
            }
        }

        let path = paths::join(&self.records[parent_index].path, name);
        if self.by_path.contains_key(&path) {
            return Err(HostError::NameInUse(path));
        }

        Ok(MemoryHandle(self.insert(parent_index, name, node_type)))
    }

    fn resolve(&self, path: &str) -> Option<MemoryHandle> {
        self.lookup(path).map(MemoryHandle)
    }

    fn set_parameter(
        &mut self,
        node: &MemoryHandle,
        name: &str,
        value: &ParamValue,
    ) -> Result<(), HostError> {
        let record = self.record(node)?;
        if let Some(catalog) = &self.catalog {
            if !catalog.accepts_parameter(&record.node_type, name) {
                return Err(HostError::UnknownParameter {
                    node: record.path.clone(),
                    parameter: name.to_string(),
                });
            }
        }
        self.records[node.0]
            .parameters
            .insert(name.to_string(), HostValue::from(value));
        Ok(())
    }

    fn connect(
        &mut self,
        node: &MemoryHandle,
        input_index: u32,
        source: &MemoryHandle,
    ) -> Result<(), HostError> {
        let target = self.record(node)?;
        let source_record = self.record(source)?;
        let rejection = |reason: &str| HostError::InvalidConnection {
            target: target.path.clone(),
            index: input_index,
            source_path: source_record.path.clone(),
            reason: reason.to_string(),
        };

        if target.container || source_record.container {
            return Err(rejection("containers cannot be wired"));
        }
        if input_index >= MAX_INPUTS {
            return Err(rejection("input index out of range"));
        }
        if self.is_upstream(node.0, source.0) {
            return Err(rejection("connection would create a cycle"));
        }

        let slot = input_index as usize;
        let inputs = &mut self.records[node.0].inputs;
        if inputs.len() <= slot {
            inputs.resize(slot + 1, None);
        }
        inputs[slot] = Some(source.0);
        Ok(())
    }

    fn enumerate_children(&self, path: &str) -> Vec<MemoryHandle> {
        self.lookup(path)
            .map(|index| {
                self.records[index]
                    .children
                    .iter()
                    .copied()
                    .map(MemoryHandle)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn describe(&self, node: &MemoryHandle) -> Result<HostNode, HostError> {
        let record = self.record(node)?;
        Ok(HostNode {
            name: record.name.clone(),
            node_type: record.node_type.clone(),
            path: record.path.clone(),
        })
    }

    fn read_parameters(&self, node: &MemoryHandle) -> IndexMap<String, HostValue> {
        self.record(node)
            .map(|r| r.parameters.clone())
            .unwrap_or_default()
    }

    fn read_inputs(&self, node: &MemoryHandle) -> Vec<(u32, Option<String>)> {
        let Ok(record) = self.record(node) else {
            return Vec::new();
        };
        record
            .inputs
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let path = source.map(|s| self.records[s].path.clone());
                (i as u32, path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_graph::{ParameterTemplate, TypeEntry};

    #[test]
    fn test_create_and_resolve() {
        let mut host = MemorySceneHost::new();
        let handle = host.create_child("/obj/geo1", "box", "box1").unwrap();
        assert_eq!(host.resolve("/obj/geo1/box1"), Some(handle));

        let info = host.describe(&handle).unwrap();
        assert_eq!(info.path, "/obj/geo1/box1");
        assert_eq!(info.node_type, "box");
        assert_eq!(host.node_count(), 1);
    }

    #[test]
    fn test_create_under_missing_parent() {
        let mut host = MemorySceneHost::new();
        let err = host.create_child("/obj/geo9", "box", "box1").unwrap_err();
        assert_eq!(err, HostError::NotFound("/obj/geo9".to_string()));
    }

    #[test]
    fn test_name_in_use() {
        let mut host = MemorySceneHost::new();
        host.create_child("/obj/geo1", "box", "box1").unwrap();
        let err = host.create_child("/obj/geo1", "sphere", "box1").unwrap_err();
        assert_eq!(err, HostError::NameInUse("/obj/geo1/box1".to_string()));
    }

    #[test]
    fn test_catalog_restricts_types_and_parameters() {
        let catalog = TypeCatalog::from_entries([TypeEntry::new(
            "xform",
            vec![ParameterTemplate::named("scale")],
        )])
        .unwrap();
        let mut host = MemorySceneHost::new().with_catalog(Arc::new(catalog));

        assert!(matches!(
            host.create_child("/obj/geo1", "box", "box1"),
            Err(HostError::InvalidType { .. })
        ));

        let xform = host.create_child("/obj/geo1", "xform", "xform1").unwrap();
        host.set_parameter(&xform, "scale", &ParamValue::Number(2.0))
            .unwrap();
        assert!(matches!(
            host.set_parameter(&xform, "sizex", &ParamValue::Number(1.0)),
            Err(HostError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut host = MemorySceneHost::new();
        let a = host.create_child("/obj/geo1", "xform", "a").unwrap();
        let b = host.create_child("/obj/geo1", "xform", "b").unwrap();

        host.connect(&b, 0, &a).unwrap();
        assert!(matches!(
            host.connect(&a, 0, &b),
            Err(HostError::InvalidConnection { .. })
        ));
        assert!(matches!(
            host.connect(&a, 0, &a),
            Err(HostError::InvalidConnection { .. })
        ));
    }

    #[test]
    fn test_read_inputs_reports_gaps() {
        let mut host = MemorySceneHost::new();
        let a = host.create_child("/obj/geo1", "box", "a").unwrap();
        let m = host.create_child("/obj/geo1", "merge", "m").unwrap();
        host.connect(&m, 2, &a).unwrap();

        assert_eq!(
            host.read_inputs(&m),
            vec![
                (0, None),
                (1, None),
                (2, Some("/obj/geo1/a".to_string()))
            ]
        );
    }

    #[test]
    fn test_connect_rejects_out_of_range_index() {
        let mut host = MemorySceneHost::new();
        let a = host.create_child("/obj/geo1", "box", "a").unwrap();
        let m = host.create_child("/obj/geo1", "merge", "m").unwrap();

        for index in [MAX_INPUTS, u32::MAX] {
            assert!(matches!(
                host.connect(&m, index, &a),
                Err(HostError::InvalidConnection { index: i, .. }) if i == index
            ));
        }
        assert!(host.read_inputs(&m).is_empty());

        host.connect(&m, MAX_INPUTS - 1, &a).unwrap();
        assert_eq!(host.read_inputs(&m).len(), MAX_INPUTS as usize);
    }

    #[test]
    fn test_enumerate_children_in_creation_order() {
        let mut host = MemorySceneHost::new();
        host.create_child("/obj/geo1", "box", "z").unwrap();
        host.create_child("/obj/geo1", "box", "a").unwrap();

        let names: Vec<String> = host
            .enumerate_children("/obj/geo1")
            .iter()
            .map(|h| host.describe(h).unwrap().name)
            .collect();
        assert_eq!(names, vec!["z", "a"]);
        assert!(host.enumerate_children("/nowhere").is_empty());
        assert_eq!(host.enumerate_children("/").len(), 1);
    }
}
