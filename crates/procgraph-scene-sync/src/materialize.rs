//! Model to host: materialization
//!
//! Nodes are created (with their parameters) in snapshot order first, and
//! only then wired, so a node may be wired to a source that appears later
//! in the snapshot. Every failure is recorded and skipped.

use node_graph::{detect_cycle, SceneNode};

use crate::error::{HostError, Result, SyncError};
use crate::host::SceneHost;
use crate::report::{HostOperation, SyncIssue, SyncReport};
use crate::synchronizer::SceneSynchronizer;

impl<H: SceneHost> SceneSynchronizer<H> {
    /// Create, parameterize and wire host nodes for `nodes`
    ///
    /// Fails only when cycle checking is enabled and the wiring contains a
    /// cycle, in which case the host is not touched.
    pub fn materialize(&mut self, nodes: &[SceneNode]) -> Result<SyncReport> {
        if self.options.check_cycles && detect_cycle(nodes) {
            log::warn!("Refusing to materialize {} node(s): wiring has a cycle", nodes.len());
            return Err(SyncError::CycleDetected);
        }

        let mut report = SyncReport::default();
        for node in nodes {
            self.create_node(node, &mut report);
        }
        for node in nodes {
            self.wire_node(node, &mut report);
        }

        for issue in &report.issues {
            log::warn!("{}", issue);
        }
        log::info!(
            "Materialized {} node(s), {} parameter(s), {} connection(s), {} issue(s)",
            report.nodes_created,
            report.parameters_set,
            report.connections_made,
            report.issues.len()
        );
        Ok(report)
    }

    fn create_node(&mut self, node: &SceneNode, report: &mut SyncReport) {
        let parent = node.parent_location().unwrap_or("/");
        let handle = match self.host.create_child(parent, &node.node_type, &node.name) {
            Ok(handle) => handle,
            Err(error) => {
                report.issues.push(SyncIssue::NodeRejected {
                    path: node.path.clone(),
                    error,
                });
                return;
            }
        };
        report.nodes_created += 1;

        for (name, value) in &node.parameters {
            match self.host.set_parameter(&handle, name, value) {
                Ok(()) => report.parameters_set += 1,
                Err(HostError::UnknownParameter { .. }) => {
                    report.issues.push(SyncIssue::MissingParameter {
                        path: node.path.clone(),
                        parameter: name.clone(),
                    });
                }
                Err(error) => report.issues.push(SyncIssue::HostRejection {
                    operation: HostOperation::SetParameter,
                    path: node.path.clone(),
                    error,
                }),
            }
        }
    }

    fn wire_node(&mut self, node: &SceneNode, report: &mut SyncReport) {
        if node.inputs.is_empty() {
            return;
        }
        let Some(target) = self.host.resolve(&node.path) else {
            report.issues.push(SyncIssue::MissingTarget {
                path: node.path.clone(),
                skipped: node.inputs.len(),
            });
            return;
        };

        for binding in &node.inputs {
            let Some(source) = self.host.resolve(&binding.path) else {
                report.issues.push(SyncIssue::UnresolvedSource {
                    target: node.path.clone(),
                    index: binding.index,
                    source_path: binding.path.clone(),
                });
                continue;
            };
            match self.host.connect(&target, binding.index, &source) {
                Ok(()) => report.connections_made += 1,
                Err(error) => report.issues.push(SyncIssue::HostRejection {
                    operation: HostOperation::Connect,
                    path: node.path.clone(),
                    error,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use node_graph::{InputBinding, ParamValue, ParameterTemplate, TypeCatalog, TypeEntry};

    use super::*;
    use crate::memory::MemorySceneHost;
    use crate::synchronizer::SyncOptions;

    fn node(name: &str, node_type: &str, inputs: &[(u32, &str)]) -> SceneNode {
        let mut n = SceneNode::new(name, node_type, format!("/obj/geo1/{}", name));
        n.inputs = inputs
            .iter()
            .map(|(i, src)| InputBinding::new(*i, format!("/obj/geo1/{}", src)))
            .collect();
        n
    }

    #[test]
    fn test_materialize_creates_and_wires() {
        let mut xform = node("xform1", "xform", &[(0, "box1")]);
        xform.parameters.insert("scale".into(), ParamValue::Number(2.0));
        let nodes = vec![node("box1", "box", &[]), xform];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        let report = sync.materialize(&nodes).unwrap();

        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.parameters_set, 1);
        assert_eq!(report.connections_made, 1);

        let host = sync.host();
        let xform = host.resolve("/obj/geo1/xform1").unwrap();
        assert_eq!(
            host.read_inputs(&xform),
            vec![(0, Some("/obj/geo1/box1".to_string()))]
        );
    }

    #[test]
    fn test_source_later_in_snapshot_is_wired() {
        let nodes = vec![node("xform1", "xform", &[(0, "box1")]), node("box1", "box", &[])];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        let report = sync.materialize(&nodes).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.connections_made, 1);
    }

    #[test]
    fn test_unresolved_source_is_skipped() {
        let nodes = vec![
            node("box1", "box", &[]),
            node("merge1", "merge", &[(0, "box1"), (1, "gone")]),
        ];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        let report = sync.materialize(&nodes).unwrap();
        assert_eq!(report.connections_made, 1);
        assert_eq!(
            report.issues,
            vec![SyncIssue::UnresolvedSource {
                target: "/obj/geo1/merge1".into(),
                index: 1,
                source_path: "/obj/geo1/gone".into(),
            }]
        );
    }

    #[test]
    fn test_missing_parameter_is_skipped() {
        let catalog = TypeCatalog::from_entries([TypeEntry::new(
            "xform",
            vec![ParameterTemplate::named("scale"), ParameterTemplate::named("ry")],
        )])
        .unwrap();
        let mut n = node("xform1", "xform", &[]);
        n.parameters.insert("scale".into(), ParamValue::Number(2.0));
        n.parameters.insert("bogus".into(), ParamValue::Number(1.0));
        n.parameters.insert("ry".into(), ParamValue::Number(15.0));

        let host = MemorySceneHost::new().with_catalog(Arc::new(catalog));
        let mut sync = SceneSynchronizer::new(host);
        let report = sync.materialize(&[n]).unwrap();

        assert_eq!(report.parameters_set, 2);
        assert_eq!(
            report.issues,
            vec![SyncIssue::MissingParameter {
                path: "/obj/geo1/xform1".into(),
                parameter: "bogus".into(),
            }]
        );
    }

    #[test]
    fn test_rejected_node_does_not_stop_the_rest() {
        let mut orphan = SceneNode::new("box2", "box", "/obj/geo9/box2");
        orphan.inputs.push(InputBinding::new(0, "/obj/geo1/box1"));
        let nodes = vec![orphan, node("box1", "box", &[]), node("out", "null", &[(0, "box2")])];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        let report = sync.materialize(&nodes).unwrap();

        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.issues.len(), 3);
        assert!(matches!(report.issues[0], SyncIssue::NodeRejected { .. }));
        assert!(matches!(report.issues[1], SyncIssue::MissingTarget { skipped: 1, .. }));
        assert!(matches!(report.issues[2], SyncIssue::UnresolvedSource { .. }));
    }

    #[test]
    fn test_cycle_fails_fast() {
        let nodes = vec![node("a", "xform", &[(0, "b")]), node("b", "xform", &[(0, "a")])];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        assert_eq!(sync.materialize(&nodes), Err(SyncError::CycleDetected));
        assert_eq!(sync.host().node_count(), 0);
    }

    #[test]
    fn test_host_rejects_cycle_when_check_disabled() {
        let nodes = vec![node("a", "xform", &[(0, "b")]), node("b", "xform", &[(0, "a")])];
        let options = SyncOptions {
            check_cycles: false,
            ..SyncOptions::default()
        };

        let mut sync = SceneSynchronizer::with_options(MemorySceneHost::new(), options);
        let report = sync.materialize(&nodes).unwrap();
        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.connections_made, 1);
        assert!(matches!(
            report.issues.as_slice(),
            [SyncIssue::HostRejection {
                operation: HostOperation::Connect,
                ..
            }]
        ));
    }

    #[test]
    fn test_huge_input_index_is_a_host_rejection() {
        let nodes = vec![
            node("box1", "box", &[]),
            node("merge1", "merge", &[(u32::MAX, "box1"), (0, "box1")]),
        ];

        let mut sync = SceneSynchronizer::new(MemorySceneHost::new());
        let report = sync.materialize(&nodes).unwrap();

        assert_eq!(report.connections_made, 1);
        assert!(matches!(
            report.issues.as_slice(),
            [SyncIssue::HostRejection {
                operation: HostOperation::Connect,
                error: HostError::InvalidConnection { index: u32::MAX, .. },
                ..
            }]
        ));
    }
}
