//! Command implementations
//!
//! Each command is a plain function over already-loaded inputs so it can be
//! exercised without going through argument parsing.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use node_graph::{
    paths, Briefing, BuildSession, GraphOperation, OperationOutcome, SceneNode, SessionOutput,
    TypeCatalog,
};
use procgraph_graph_store::{
    GraphProjector, GraphStore, MemoryGraphStore, ProjectionReport, SqliteGraphStore, StoreStats,
};
use procgraph_scene_sync::{Extraction, MemorySceneHost, SceneHost, SceneSynchronizer, SyncReport};
use serde_json::Value;

use crate::config::AppConfig;

/// Container type created for parent locations missing from the host
const CONTAINER_TYPE: &str = "geo";

/// A script entry that could not be read as an operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("script entry {index} rejected: {message}")]
pub struct ScriptError {
    pub index: usize,
    pub message: String,
}

/// One script entry: an operation, or why it could not be read
pub type ScriptEntry = Result<GraphOperation, ScriptError>;

/// Outcome of one script entry
pub type EntryOutcome = Result<OperationOutcome, ScriptError>;

/// Read an operation script, filling in the default location
///
/// A script is a JSON array of operations. `create_node` entries without a
/// `location` are created under `default_location`. Entries are read one at
/// a time; a malformed entry does not discard the rest of the script.
pub fn load_script(path: &Path, default_location: &str) -> anyhow::Result<Vec<ScriptEntry>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read script '{}'", path.display()))?;
    parse_script(&source, default_location)
        .with_context(|| format!("parse script '{}'", path.display()))
}

pub fn parse_script(source: &str, default_location: &str) -> anyhow::Result<Vec<ScriptEntry>> {
    let raw: Vec<Value> = serde_json::from_str(source)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, op)| {
            parse_operation(op, default_location).map_err(|e| ScriptError {
                index,
                message: e.to_string(),
            })
        })
        .collect())
}

fn parse_operation(mut op: Value, default_location: &str) -> serde_json::Result<GraphOperation> {
    let is_create = op.get("op").and_then(Value::as_str) == Some("create_node");
    if let (true, Some(fields)) = (is_create, op.as_object_mut()) {
        fields
            .entry("location")
            .or_insert_with(|| Value::String(default_location.to_string()));
    }
    serde_json::from_value(op)
}

/// Operations of a script, logging the entries that could not be read
pub fn readable(entries: Vec<ScriptEntry>) -> Vec<GraphOperation> {
    entries
        .into_iter()
        .filter_map(|entry| entry.inspect_err(|e| log::warn!("{}", e)).ok())
        .collect()
}

pub fn read_nodes(path: &Path) -> anyhow::Result<Vec<SceneNode>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read nodes '{}'", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parse nodes '{}'", path.display()))
}

/// Apply a script in a fresh session and hand back the finished graph
///
/// Outcomes line up with `entries`; unreadable entries keep their error.
pub fn build(
    catalog: Arc<TypeCatalog>,
    config: &AppConfig,
    entries: Vec<ScriptEntry>,
) -> (Vec<EntryOutcome>, SessionOutput) {
    let mut session = BuildSession::with_policy(catalog, config.graph);
    let outcomes = entries
        .into_iter()
        .map(|entry| {
            entry.map(|operation| {
                let result = session.apply(&operation);
                OperationOutcome { operation, result }
            })
        })
        .collect();
    (outcomes, session.finish())
}

/// Apply a script and describe the resulting session
pub fn brief(
    catalog: Arc<TypeCatalog>,
    config: &AppConfig,
    operations: Vec<GraphOperation>,
) -> Briefing {
    let mut session = BuildSession::with_policy(catalog, config.graph);
    session.apply_all(operations);
    session.briefing()
}

/// Materialize `nodes` in a fresh in-memory host and extract them again
///
/// Parent locations that neither exist in the host nor belong to the
/// snapshot are created as containers first.
pub fn round_trip(
    catalog: Arc<TypeCatalog>,
    config: &AppConfig,
    nodes: &[SceneNode],
) -> anyhow::Result<(SyncReport, Extraction)> {
    let mut host = MemorySceneHost::new().with_catalog(catalog);
    for node in nodes {
        if let Some(parent) = paths::parent_of(&node.path) {
            let in_snapshot = nodes.iter().any(|n| n.path == parent);
            if !in_snapshot && host.resolve(parent).is_none() {
                host.add_container(parent, CONTAINER_TYPE);
            }
        }
    }

    let mut sync = SceneSynchronizer::with_options(host, config.sync.clone());
    let report = sync.materialize(nodes)?;
    let extraction = sync.extract();
    Ok((report, extraction))
}

/// Project `nodes` into the configured store
///
/// Returns the projection report, the store totals afterwards and, when
/// `lineage_of` is given, the upstream paths of that node.
pub async fn project(
    config: &AppConfig,
    nodes: &[SceneNode],
    lineage_of: Option<&str>,
) -> anyhow::Result<(ProjectionReport, StoreStats, Vec<String>)> {
    let store: Arc<dyn GraphStore> = match &config.database_path {
        Some(path) => Arc::new(
            SqliteGraphStore::open(path)
                .with_context(|| format!("open graph store '{}'", path.display()))?,
        ),
        None => Arc::new(MemoryGraphStore::new()),
    };

    let projector = GraphProjector::with_keying(Arc::clone(&store), config.parameter_keying);
    let report = projector.project(nodes).await;
    let stats = store.stats().await?;
    let lineage = match lineage_of {
        Some(path) => store.upstream(path).await?,
        None => Vec::new(),
    };
    Ok((report, stats, lineage))
}

/// Write `config` to `path`, refusing to replace a file unless `force`
pub async fn init_config(config: &AppConfig, path: &Path, force: bool) -> anyhow::Result<()> {
    if !force && tokio::fs::try_exists(path).await? {
        anyhow::bail!("'{}' already exists; pass --force to replace it", path.display());
    }
    config
        .save(path)
        .await
        .with_context(|| format!("write configuration '{}'", path.display()))
}
