//! Append-only chat log, the relational metadata side of a brain.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::info;

use crate::schema::CHAT_SCHEMA_SQL;
use cerebro_core::{ChatRecord, Error, Result};

/// SQLite-backed chat log. One row per question, one per answer.
pub struct ChatLog {
    conn: Mutex<Connection>,
}

impl ChatLog {
    /// Open or create the chat database.
    pub fn open(db_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(CHAT_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("schema init failed: {}", e)))?;
        info!("Chat log opened at {}", db_path.as_ref().display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory log for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(CHAT_SCHEMA_SQL)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Append one record, returning its id.
    pub fn save(
        &self,
        is_answer: bool,
        text: &str,
        brain_id: &str,
        referenced_nodes: Option<&[String]>,
    ) -> Result<i64> {
        let referenced_json = referenced_nodes
            .map(serde_json::to_string)
            .transpose()?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO chats (brain_id, is_answer, text, referenced_nodes, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![brain_id, is_answer, text, referenced_json, now])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// All records of a brain, oldest first.
    pub fn history(&self, brain_id: &str) -> Result<Vec<ChatRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, is_answer, text, referenced_nodes, created_at \
                 FROM chats WHERE brain_id = ?1 ORDER BY id",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![brain_id], |row| {
                let referenced: Option<String> = row.get(3)?;
                Ok(ChatRecord {
                    id: row.get(0)?,
                    is_answer: row.get(1)?,
                    text: row.get(2)?,
                    brain_id: brain_id.to_string(),
                    referenced_nodes: referenced.and_then(|s| serde_json::from_str(&s).ok()),
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Remove a brain's entire chat history.
    pub fn delete_by_brain(&self, brain_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM chats WHERE brain_id = ?1", params![brain_id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_history() {
        let log = ChatLog::open_in_memory().unwrap();
        let q_id = log.save(false, "What is Rust?", "b1", None).unwrap();
        let refs = vec!["Rust".to_string()];
        let a_id = log.save(true, "A systems language.", "b1", Some(&refs)).unwrap();
        assert!(a_id > q_id);

        let history = log.history("b1").unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_answer);
        assert!(history[1].is_answer);
        assert_eq!(history[1].referenced_nodes.as_deref(), Some(&refs[..]));
    }

    #[test]
    fn test_delete_by_brain() {
        let log = ChatLog::open_in_memory().unwrap();
        log.save(false, "q", "b1", None).unwrap();
        log.save(false, "q", "b2", None).unwrap();

        assert_eq!(log.delete_by_brain("b1").unwrap(), 1);
        assert!(log.history("b1").unwrap().is_empty());
        assert_eq!(log.history("b2").unwrap().len(), 1);
    }
}
