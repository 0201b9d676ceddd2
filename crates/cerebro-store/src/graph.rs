//! Graph store adapter: per-brain labeled graph over SQLite.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::schema::GRAPH_SCHEMA_SQL;
use cerebro_core::{Edge, Error, FullGraph, GraphLink, GraphNodeRef, GraphSchema, Node, NodeDescription, Result};

/// Traversal depth of the retrieval schema, measured in edge hops
/// regardless of direction.
pub const SCHEMA_DEPTH: usize = 2;

/// Typed interface over the labeled-graph backend. All queries are scoped
/// by brain id; no other component issues raw graph queries.
pub trait GraphStore: Send + Sync {
    /// Create the node if absent and append one source-attributed
    /// description. Appending is a single atomic insert at the store level.
    fn upsert_node(&self, name: &str, description: &str, source_id: &str, brain_id: &str) -> Result<()>;

    /// Insert an edge row. The identity tuple `(source, target, relation,
    /// source_id)` is unique per brain; re-inserting it is a no-op.
    fn upsert_edge(&self, edge: &Edge, brain_id: &str) -> Result<()>;

    /// Whole-brain view. Empty for an unknown brain, never an error.
    fn full_graph(&self, brain_id: &str) -> Result<FullGraph>;

    /// Seed nodes plus everything reachable within [`SCHEMA_DEPTH`]
    /// direction-agnostic hops, and all edges incident to a visited node.
    fn two_hop_schema(&self, seed_names: &[String], brain_id: &str) -> Result<GraphSchema>;

    /// Description list of a node, in insertion order.
    fn descriptions(&self, node_name: &str, brain_id: &str) -> Result<Vec<NodeDescription>>;

    /// Names of nodes carrying at least one description from the source.
    fn nodes_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>>;

    /// Edges produced by the source.
    fn edges_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<Edge>>;

    /// Remove every description and edge from the source; nodes left with
    /// zero descriptions are deleted along with their remaining incident
    /// edges. Returns the names of fully-removed nodes.
    fn delete_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>>;

    /// Remove all graph data of the brain.
    fn delete_brain(&self, brain_id: &str) -> Result<()>;
}

/// SQLite-backed graph store.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    /// Open or create the graph database.
    pub fn open(db_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::GraphStore(e.to_string()))?;
        conn.execute_batch(GRAPH_SCHEMA_SQL)
            .map_err(|e| Error::GraphStore(format!("schema init failed: {}", e)))?;
        info!("Graph store opened at {}", db_path.as_ref().display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::GraphStore(e.to_string()))?;
        conn.execute_batch(GRAPH_SCHEMA_SQL)
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn load_node(conn: &Connection, name: &str, brain_id: &str) -> Result<Option<Node>> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT text, source_id FROM node_descriptions \
                 WHERE brain_id = ?1 AND node_name = ?2 ORDER BY id",
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let rows = stmt
            .query_map(params![brain_id, name], |row| {
                Ok(NodeDescription {
                    text: row.get(0)?,
                    source_id: row.get(1)?,
                })
            })
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let descriptions: Vec<NodeDescription> =
            rows.collect::<std::result::Result<_, _>>().map_err(|e| Error::GraphStore(e.to_string()))?;
        if descriptions.is_empty() {
            return Ok(None);
        }
        Ok(Some(Node { name: name.to_string(), descriptions }))
    }

    fn load_edges(conn: &Connection, brain_id: &str) -> Result<Vec<Edge>> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT source, target, relation, source_id FROM edges \
                 WHERE brain_id = ?1 ORDER BY id",
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let rows = stmt
            .query_map(params![brain_id], |row| {
                Ok(Edge {
                    source: row.get(0)?,
                    target: row.get(1)?,
                    relation: row.get(2)?,
                    source_id: row.get(3)?,
                })
            })
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        rows.collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::GraphStore(e.to_string()))
    }
}

impl GraphStore for SqliteGraphStore {
    fn upsert_node(&self, name: &str, description: &str, source_id: &str, brain_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached("INSERT OR IGNORE INTO nodes (brain_id, name) VALUES (?1, ?2)")
            .map_err(|e| Error::GraphStore(e.to_string()))?
            .execute(params![brain_id, name])
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        conn.prepare_cached(
            "INSERT INTO node_descriptions (brain_id, node_name, source_id, text) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| Error::GraphStore(e.to_string()))?
        .execute(params![brain_id, name, source_id, description])
        .map_err(|e| Error::GraphStore(e.to_string()))?;
        Ok(())
    }

    fn upsert_edge(&self, edge: &Edge, brain_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR IGNORE INTO edges (brain_id, source, target, relation, source_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| Error::GraphStore(e.to_string()))?
        .execute(params![brain_id, edge.source, edge.target, edge.relation, edge.source_id])
        .map_err(|e| Error::GraphStore(e.to_string()))?;
        Ok(())
    }

    fn full_graph(&self, brain_id: &str) -> Result<FullGraph> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT name FROM nodes WHERE brain_id = ?1 ORDER BY name")
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let nodes: Vec<GraphNodeRef> = stmt
            .query_map(params![brain_id], |row| {
                Ok(GraphNodeRef { name: row.get(0)? })
            })
            .map_err(|e| Error::GraphStore(e.to_string()))?
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::GraphStore(e.to_string()))?;

        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT source, target, relation FROM edges \
                 WHERE brain_id = ?1 ORDER BY source, target, relation",
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let links: Vec<GraphLink> = stmt
            .query_map(params![brain_id], |row| {
                Ok(GraphLink {
                    source: row.get(0)?,
                    target: row.get(1)?,
                    relation: row.get(2)?,
                })
            })
            .map_err(|e| Error::GraphStore(e.to_string()))?
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::GraphStore(e.to_string()))?;

        Ok(FullGraph { nodes, links })
    }

    fn two_hop_schema(&self, seed_names: &[String], brain_id: &str) -> Result<GraphSchema> {
        let conn = self.conn.lock();
        let all_edges = Self::load_edges(&conn, brain_id)?;

        // Undirected adjacency: depth counts edge hops regardless of direction.
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &all_edges {
            adjacency.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
            adjacency.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
        }

        let seeds: HashSet<&str> = seed_names.iter().map(|s| s.as_str()).collect();
        let mut visited: HashSet<&str> = seeds.clone();
        let mut queue: VecDeque<(&str, usize)> =
            seed_names.iter().map(|s| (s.as_str(), 0)).collect();
        while let Some((name, depth)) = queue.pop_front() {
            if depth == SCHEMA_DEPTH {
                continue;
            }
            if let Some(neighbors) = adjacency.get(name) {
                for &next in neighbors {
                    if visited.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }

        // Seed records in seed order; seeds missing from the graph are skipped.
        let mut nodes = Vec::new();
        for name in seed_names {
            if let Some(node) = Self::load_node(&conn, name, brain_id)? {
                nodes.push(node);
            }
        }

        // Related records in name order for a reproducible serialization.
        let mut related_names: Vec<&str> =
            visited.iter().filter(|n| !seeds.contains(*n)).copied().collect();
        related_names.sort_unstable();
        let mut related_nodes = Vec::new();
        for name in related_names {
            if let Some(node) = Self::load_node(&conn, name, brain_id)? {
                related_nodes.push(node);
            }
        }

        let edges: Vec<Edge> = all_edges
            .iter()
            .filter(|e| visited.contains(e.source.as_str()) || visited.contains(e.target.as_str()))
            .cloned()
            .collect();

        debug!(
            "two-hop schema for {} seeds: {} seed nodes, {} related, {} edges",
            seed_names.len(),
            nodes.len(),
            related_nodes.len(),
            edges.len()
        );
        Ok(GraphSchema { nodes, related_nodes, edges })
    }

    fn descriptions(&self, node_name: &str, brain_id: &str) -> Result<Vec<NodeDescription>> {
        let conn = self.conn.lock();
        Ok(Self::load_node(&conn, node_name, brain_id)?
            .map(|n| n.descriptions)
            .unwrap_or_default())
    }

    fn nodes_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT node_name FROM node_descriptions \
                 WHERE brain_id = ?1 AND source_id = ?2 ORDER BY node_name",
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let rows = stmt
            .query_map(params![brain_id, source_id], |row| row.get(0))
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        rows.collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::GraphStore(e.to_string()))
    }

    fn edges_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<Edge>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT source, target, relation, source_id FROM edges \
                 WHERE brain_id = ?1 AND source_id = ?2 ORDER BY id",
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        let rows = stmt
            .query_map(params![brain_id, source_id], |row| {
                Ok(Edge {
                    source: row.get(0)?,
                    target: row.get(1)?,
                    relation: row.get(2)?,
                    source_id: row.get(3)?,
                })
            })
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        rows.collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::GraphStore(e.to_string()))
    }

    fn delete_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::GraphStore(e.to_string()))?;

        tx.execute(
            "DELETE FROM node_descriptions WHERE brain_id = ?1 AND source_id = ?2",
            params![brain_id, source_id],
        )
        .map_err(|e| Error::GraphStore(e.to_string()))?;
        tx.execute(
            "DELETE FROM edges WHERE brain_id = ?1 AND source_id = ?2",
            params![brain_id, source_id],
        )
        .map_err(|e| Error::GraphStore(e.to_string()))?;

        // A node may not outlive its last description.
        let removed: Vec<String> = {
            let mut stmt = tx
                .prepare(
                    "SELECT name FROM nodes n WHERE brain_id = ?1 AND NOT EXISTS (\
                     SELECT 1 FROM node_descriptions d \
                     WHERE d.brain_id = n.brain_id AND d.node_name = n.name) \
                     ORDER BY name",
                )
                .map_err(|e| Error::GraphStore(e.to_string()))?;
            let rows = stmt
                .query_map(params![brain_id], |row| row.get(0))
                .map_err(|e| Error::GraphStore(e.to_string()))?;
            rows.collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::GraphStore(e.to_string()))?
        };

        for name in &removed {
            tx.execute(
                "DELETE FROM nodes WHERE brain_id = ?1 AND name = ?2",
                params![brain_id, name],
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
            tx.execute(
                "DELETE FROM edges WHERE brain_id = ?1 AND (source = ?2 OR target = ?2)",
                params![brain_id, name],
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        }

        tx.commit().map_err(|e| Error::GraphStore(e.to_string()))?;
        info!(
            "deleted source {} from brain {}: {} nodes fully removed",
            source_id,
            brain_id,
            removed.len()
        );
        Ok(removed)
    }

    fn delete_brain(&self, brain_id: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::GraphStore(e.to_string()))?;
        for table in ["node_descriptions", "edges", "nodes"] {
            tx.execute(
                &format!("DELETE FROM {} WHERE brain_id = ?1", table),
                params![brain_id],
            )
            .map_err(|e| Error::GraphStore(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::GraphStore(e.to_string()))?;
        info!("deleted all graph data for brain {}", brain_id);
        Ok(())
    }
}
