//! Vector index adapter: per-brain embedding collections over SQLite,
//! cosine similarity via normalized ndarray dot products.

use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::schema::VECTOR_SCHEMA_SQL;
use cerebro_core::{Error, Result, SimilarNode};

/// Typed interface over the per-brain similarity index.
pub trait VectorIndex: Send + Sync {
    fn collection_exists(&self, brain_id: &str) -> Result<bool>;

    /// Idempotent: creating an existing collection is success, so two
    /// concurrent creators for a fresh brain cannot fail each other.
    fn create_collection(&self, brain_id: &str) -> Result<()>;

    /// Drop the collection and every record in it.
    fn drop_collection(&self, brain_id: &str) -> Result<()>;

    /// Store the vector for a node, replacing any prior vector. Exactly one
    /// active record per node per brain. `source_id` records which ingestion
    /// wrote the current vector.
    fn upsert(&self, node_name: &str, vector: &[f32], source_id: &str, brain_id: &str) -> Result<()>;

    /// Top-k most similar nodes, ordered by score descending then name
    /// ascending. An empty or absent collection yields an empty list.
    fn search(&self, vector: &[f32], brain_id: &str, k: usize) -> Result<Vec<SimilarNode>>;

    /// Remove records whose current vector was written by the source.
    fn delete_by_source(&self, source_id: &str, brain_id: &str) -> Result<()>;

    fn delete_node(&self, node_name: &str, brain_id: &str) -> Result<()>;

    fn delete_nodes(&self, node_names: &[String], brain_id: &str) -> Result<()> {
        for name in node_names {
            self.delete_node(name, brain_id)?;
        }
        Ok(())
    }
}

/// SQLite-backed vector index.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
    dim: usize,
}

impl SqliteVectorIndex {
    /// Open or create the vector database.
    pub fn open(db_path: impl AsRef<std::path::Path>, dim: usize) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        conn.execute_batch(VECTOR_SCHEMA_SQL)
            .map_err(|e| Error::VectorStore(format!("schema init failed: {}", e)))?;
        info!("Vector index opened at {}, dim={}", db_path.as_ref().display(), dim);
        Ok(Self { conn: Mutex::new(conn), dim })
    }

    /// In-memory index for tests.
    pub fn open_in_memory(dim: usize) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::VectorStore(e.to_string()))?;
        conn.execute_batch(VECTOR_SCHEMA_SQL)
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn), dim })
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
        let mut blob = Vec::with_capacity(vector.len() * 4);
        for v in vector {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob
    }

    fn blob_to_vector(blob: &[u8]) -> Array1<f32> {
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn collection_exists(&self, brain_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM collections WHERE brain_id = ?1",
                params![brain_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(count > 0)
    }

    fn create_collection(&self, brain_id: &str) -> Result<()> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO collections (brain_id, dim, created_at) VALUES (?1, ?2, ?3)",
            params![brain_id, self.dim as i64, now],
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        debug!("collection ready for brain {}", brain_id);
        Ok(())
    }

    fn drop_collection(&self, brain_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM embeddings WHERE brain_id = ?1", params![brain_id])
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        conn.execute("DELETE FROM collections WHERE brain_id = ?1", params![brain_id])
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        info!("dropped vector collection for brain {}", brain_id);
        Ok(())
    }

    fn upsert(&self, node_name: &str, vector: &[f32], source_id: &str, brain_id: &str) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::VectorStore(format!(
                "dimension mismatch: expected {}, got {}",
                self.dim,
                vector.len()
            )));
        }
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR REPLACE INTO embeddings (brain_id, node_name, vector, source_id) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?
        .execute(params![brain_id, node_name, Self::vector_to_blob(vector), source_id])
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(())
    }

    fn search(&self, vector: &[f32], brain_id: &str, k: usize) -> Result<Vec<SimilarNode>> {
        if vector.len() != self.dim {
            return Err(Error::VectorStore(format!(
                "dimension mismatch: expected {}, got {}",
                self.dim,
                vector.len()
            )));
        }
        let (names, rows) = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare_cached(
                    "SELECT node_name, vector FROM embeddings \
                     WHERE brain_id = ?1 ORDER BY node_name",
                )
                .map_err(|e| Error::VectorStore(e.to_string()))?;
            let mapped = stmt
                .query_map(params![brain_id], |row| {
                    let name: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    Ok((name, blob))
                })
                .map_err(|e| Error::VectorStore(e.to_string()))?;

            let mut names = Vec::new();
            let mut rows: Vec<Array1<f32>> = Vec::new();
            for row in mapped {
                let (name, blob) = row.map_err(|e| Error::VectorStore(e.to_string()))?;
                names.push(name);
                rows.push(Self::blob_to_vector(&blob));
            }
            (names, rows)
        };

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query = Array1::from(vector.to_vec());
        let q_norm = query.dot(&query).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = &query / q_norm;

        // Stack into a matrix, normalize rows, cosine = dot product.
        let mut matrix = Array2::zeros((rows.len(), self.dim));
        for (i, emb) in rows.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }
        let similarities = matrix.dot(&q);

        let mut hits: Vec<SimilarNode> = names
            .into_iter()
            .zip(similarities.iter())
            .map(|(name, &score)| SimilarNode { name, score })
            .collect();
        // Score descending, then name ascending so ties are reproducible.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn delete_by_source(&self, source_id: &str, brain_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM embeddings WHERE brain_id = ?1 AND source_id = ?2",
            params![brain_id, source_id],
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(())
    }

    fn delete_node(&self, node_name: &str, brain_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM embeddings WHERE brain_id = ?1 AND node_name = ?2",
            params![brain_id, node_name],
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(())
    }
}
