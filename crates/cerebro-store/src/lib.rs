//! Cerebro Store — per-brain knowledge graph, vector index and chat log
//! over three independent SQLite files.

pub mod chat;
pub mod graph;
pub mod schema;
pub mod vector;

pub use chat::ChatLog;
pub use graph::{GraphStore, SqliteGraphStore, SCHEMA_DEPTH};
pub use vector::{SqliteVectorIndex, VectorIndex};
