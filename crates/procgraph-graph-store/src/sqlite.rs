//! SQLite-backed graph store
//!
//! Vertices and edges live in three tables. Parameter values are stored as
//! JSON text. Every call runs on the blocking thread pool so the async
//! runtime is never stalled by disk I/O.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::schema::{Edge, EdgeKind, NodeVertex, ParameterVertex, StoreStats};
use crate::store::GraphStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS houdini_nodes (
    path TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    node_type TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS parameters (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    UNIQUE (kind, source, target)
);
CREATE INDEX IF NOT EXISTS edges_target ON edges (target);
";

/// Graph store persisted in a SQLite database
#[derive(Clone)]
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("Opened graph store at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn node_exists(conn: &Connection, path: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM houdini_nodes WHERE path = ?1",
            params![path],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parameter_exists(conn: &Connection, key: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM parameters WHERE key = ?1",
            params![key],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn require(exists: bool, key: &str) -> Result<()> {
    if exists {
        Ok(())
    } else {
        Err(StoreError::MissingVertex(key.to_string()))
    }
}

fn insert_edge(conn: &Connection, kind: EdgeKind, source: &str, target: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO edges (kind, source, target) VALUES (?1, ?2, ?3)
         ON CONFLICT (kind, source, target) DO NOTHING",
        params![kind.as_str(), source, target],
    )?;
    Ok(())
}

fn count(conn: &Connection, table: &str) -> Result<usize> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(usize::try_from(n).unwrap_or_default())
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn upsert_node(&self, vertex: &NodeVertex) -> Result<()> {
        let vertex = vertex.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO houdini_nodes (path, name, node_type) VALUES (?1, ?2, ?3)
                 ON CONFLICT (path) DO UPDATE SET name = excluded.name, node_type = excluded.node_type",
                params![vertex.path, vertex.name, vertex.node_type],
            )?;
            Ok(())
        })
        .await
    }

    async fn upsert_parameter(&self, node_path: &str, parameter: &ParameterVertex) -> Result<()> {
        let node_path = node_path.to_string();
        let key = parameter.key.clone();
        let value = serde_json::to_string(&parameter.value)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            require(node_exists(&tx, &node_path)?, &node_path)?;
            tx.execute(
                "INSERT INTO parameters (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            insert_edge(&tx, EdgeKind::HasParameter, &node_path, &key)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<()> {
        let edge = edge.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            require(node_exists(&tx, &edge.from)?, &edge.from)?;
            let target_exists = if edge.kind.targets_parameter() {
                parameter_exists(&tx, &edge.to)?
            } else {
                node_exists(&tx, &edge.to)?
            };
            require(target_exists, &edge.to)?;
            insert_edge(&tx, edge.kind, &edge.from, &edge.to)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn node(&self, path: &str) -> Result<Option<NodeVertex>> {
        let path = path.to_string();
        self.with_conn(move |conn| {
            let vertex = conn
                .query_row(
                    "SELECT path, name, node_type FROM houdini_nodes WHERE path = ?1",
                    params![path],
                    |row| {
                        Ok(NodeVertex {
                            path: row.get(0)?,
                            name: row.get(1)?,
                            node_type: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(vertex)
        })
        .await
    }

    async fn parameter(&self, key: &str) -> Result<Option<ParameterVertex>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value FROM parameters WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            match raw {
                Some(raw) => Ok(Some(ParameterVertex {
                    key,
                    value: serde_json::from_str(&raw)?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    async fn edges(&self) -> Result<Vec<Edge>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT kind, source, target FROM edges ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut edges = Vec::new();
            for row in rows {
                let (kind, from, to) = row?;
                edges.push(Edge::new(kind.parse()?, from, to));
            }
            Ok(edges)
        })
        .await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            Ok(StoreStats {
                nodes: count(conn, "houdini_nodes")?,
                parameters: count(conn, "parameters")?,
                edges: count(conn, "edges")?,
            })
        })
        .await
    }
}
