//! Host to model: extraction
//!
//! Walks the host hierarchy below the configured root, depth first with
//! parents before children. The first `container_depth` levels are walked
//! but not recorded; every node below them becomes a [`SceneNode`].

use std::collections::HashSet;

use indexmap::IndexMap;
use node_graph::{InputBinding, SceneNode};

use crate::coerce::coerce;
use crate::host::SceneHost;
use crate::report::{Extraction, HostOperation, SyncIssue};
use crate::synchronizer::SceneSynchronizer;

impl<H: SceneHost> SceneSynchronizer<H> {
    /// Read the host scene into a snapshot
    ///
    /// Never fails: unreadable nodes, inputs pointing outside the extracted
    /// set and repeated names are reported alongside the nodes.
    pub fn extract(&mut self) -> Extraction {
        let mut extraction = Extraction::default();
        let root = self.options.extract_root.clone();
        self.walk(&root, 0, &mut extraction);
        check_references(&mut extraction);

        log::info!(
            "Extracted {} node(s) from {} with {} issue(s)",
            extraction.nodes.len(),
            root,
            extraction.issues.len()
        );
        extraction
    }

    fn walk(&self, path: &str, depth: usize, extraction: &mut Extraction) {
        for handle in self.host.enumerate_children(path) {
            let info = match self.host.describe(&handle) {
                Ok(info) => info,
                Err(error) => {
                    extraction.issues.push(SyncIssue::HostRejection {
                        operation: HostOperation::Describe,
                        path: path.to_string(),
                        error,
                    });
                    continue;
                }
            };

            if depth >= self.options.container_depth {
                let inputs = self
                    .host
                    .read_inputs(&handle)
                    .into_iter()
                    .filter_map(|(index, source)| source.map(|p| InputBinding::new(index, p)))
                    .collect();
                let parameters: IndexMap<_, _> = self
                    .host
                    .read_parameters(&handle)
                    .into_iter()
                    .map(|(name, value)| (name, coerce(value)))
                    .collect();

                extraction.nodes.push(SceneNode {
                    name: info.name,
                    node_type: info.node_type,
                    path: info.path.clone(),
                    inputs,
                    parameters,
                });
            }

            self.walk(&info.path, depth + 1, extraction);
        }
    }
}

/// Report dangling inputs and repeated names
fn check_references(extraction: &mut Extraction) {
    let paths: HashSet<&str> = extraction.nodes.iter().map(|n| n.path.as_str()).collect();
    let mut names = HashSet::new();
    let mut issues = Vec::new();

    for node in &extraction.nodes {
        if !names.insert(node.name.as_str()) {
            issues.push(SyncIssue::DuplicateName {
                name: node.name.clone(),
                path: node.path.clone(),
            });
        }
        for binding in &node.inputs {
            if !paths.contains(binding.path.as_str()) {
                issues.push(SyncIssue::DanglingInput {
                    node: node.name.clone(),
                    index: binding.index,
                    source_path: binding.path.clone(),
                });
            }
        }
    }

    extraction.issues.extend(issues);
}
