//! Node type catalog
//!
//! The catalog is the read-only vocabulary of node types a graph may use,
//! together with the parameters each type accepts. It is loaded once per
//! process and shared by reference; graph operations never modify it.
//!
//! # Source format
//!
//! ```json
//! [
//!   { "type": "box", "parameters": ["sizex", "sizey", "sizez"] },
//!   { "type": "xform", "parameters": [
//!       { "name": "scale", "label": "Uniform Scale", "type": "float", "default": 1 }
//!   ] }
//! ]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::value::ParamValue;

/// Shape of a parameter as declared by its type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Float,
    Int,
    Toggle,
    String,
    Vector,
    Menu,
    #[default]
    #[serde(other)]
    Other,
}

/// Declared parameter of a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTemplate {
    /// Parameter name used when setting values
    pub name: String,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Value shape
    #[serde(rename = "type", default)]
    pub kind: ParamKind,
    /// Default value, if the catalog records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl ParameterTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            kind: ParamKind::Other,
            default: None,
        }
    }
}

/// A parameter entry as it appears in the source file
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParameter {
    Name(String),
    Template(ParameterTemplate),
}

impl From<RawParameter> for ParameterTemplate {
    fn from(raw: RawParameter) -> Self {
        match raw {
            RawParameter::Name(name) => ParameterTemplate::named(name),
            RawParameter::Template(template) => template,
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

/// Catalog entry for one node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeEntry {
    #[serde(rename = "type")]
    pub node_type: String,
    pub parameters: Vec<ParameterTemplate>,
}

impl TypeEntry {
    pub fn new(node_type: impl Into<String>, parameters: Vec<ParameterTemplate>) -> Self {
        Self {
            node_type: node_type.into(),
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterTemplate> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Read-only table of node types and their parameter schemas
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    entries: IndexMap<String, TypeEntry>,
}

impl TypeCatalog {
    /// Build a catalog from entries
    pub fn from_entries(
        entries: impl IntoIterator<Item = TypeEntry>,
    ) -> Result<Self, CatalogError> {
        let mut map = IndexMap::new();
        for entry in entries {
            if map.contains_key(&entry.node_type) {
                return Err(CatalogError::DuplicateType(entry.node_type));
            }
            map.insert(entry.node_type.clone(), entry);
        }
        if map.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { entries: map })
    }

    /// Parse a catalog from its JSON source
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawEntry> = serde_json::from_str(source)?;
        Self::from_entries(raw.into_iter().map(|entry| {
            TypeEntry::new(
                entry.node_type,
                entry.parameters.into_iter().map(Into::into).collect(),
            )
        }))
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&source)?;
        log::info!(
            "Loaded type catalog with {} node types from {:?}",
            catalog.len(),
            path
        );
        Ok(catalog)
    }

    /// The legal node type vocabulary
    pub fn allowed_types(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Check if a node type is registered
    pub fn contains(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// Schema for one node type
    pub fn schema(&self, node_type: &str) -> Option<&TypeEntry> {
        self.entries.get(node_type)
    }

    /// Parameter schemas for just the given types
    ///
    /// Unknown types are skipped. The result follows catalog order so the
    /// output is stable regardless of the order of `types`.
    pub fn parameters_for<'a>(
        &self,
        types: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, Vec<ParameterTemplate>> {
        let wanted: BTreeSet<&str> = types.into_iter().collect();
        self.entries
            .values()
            .filter(|entry| wanted.contains(entry.node_type.as_str()))
            .map(|entry| (entry.node_type.clone(), entry.parameters.clone()))
            .collect()
    }

    /// Whether a parameter name is declared for a type
    ///
    /// Types registered without any parameters accept every name; unknown
    /// types accept none.
    pub fn accepts_parameter(&self, node_type: &str, parameter: &str) -> bool {
        match self.entries.get(node_type) {
            Some(entry) => entry.parameters.is_empty() || entry.parameter(parameter).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.values()
    }
}
