//! Database schema SQL for the three stores.

/// Graph store tables: nodes, node_descriptions, edges.
///
/// Descriptions live in their own table so that appending one is a single
/// INSERT; concurrent ingestions touching the same node cannot lose an
/// append. A node row without description rows is an invariant violation
/// and is removed by the deletion paths.
pub const GRAPH_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    brain_id TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (brain_id, name)
);

CREATE TABLE IF NOT EXISTS node_descriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id TEXT NOT NULL,
    node_name TEXT NOT NULL,
    source_id TEXT NOT NULL,
    text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_descriptions_node ON node_descriptions(brain_id, node_name);
CREATE INDEX IF NOT EXISTS idx_descriptions_source ON node_descriptions(brain_id, source_id);

CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id TEXT NOT NULL,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relation TEXT NOT NULL,
    source_id TEXT NOT NULL,
    UNIQUE (brain_id, source, target, relation, source_id)
);

CREATE INDEX IF NOT EXISTS idx_edges_brain ON edges(brain_id);
CREATE INDEX IF NOT EXISTS idx_edges_source_id ON edges(brain_id, source_id);
"#;

/// Vector index tables: one logical collection per brain.
pub const VECTOR_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    brain_id TEXT PRIMARY KEY,
    dim INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS embeddings (
    brain_id TEXT NOT NULL,
    node_name TEXT NOT NULL,
    vector BLOB NOT NULL,
    source_id TEXT NOT NULL,
    PRIMARY KEY (brain_id, node_name)
);

CREATE INDEX IF NOT EXISTS idx_embeddings_source ON embeddings(brain_id, source_id);
"#;

/// Chat log table: append-only, one row per question and one per answer.
pub const CHAT_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id TEXT NOT NULL,
    is_answer INTEGER NOT NULL,
    text TEXT NOT NULL,
    referenced_nodes TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chats_brain ON chats(brain_id);
"#;
