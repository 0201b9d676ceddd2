//! Tenant lifecycle: cascading brain deletes and source-scoped deletes
//! across the graph store, vector index and chat log.

use std::sync::Arc;

use tracing::{error, info};

use cerebro_core::Result;
use cerebro_store::{ChatLog, GraphStore, VectorIndex};

/// Deletes tenant data across all three backends.
pub struct TenantLifecycle {
    graph: Arc<dyn GraphStore>,
    vectors: Arc<dyn VectorIndex>,
    chat: Arc<ChatLog>,
}

impl TenantLifecycle {
    pub fn new(graph: Arc<dyn GraphStore>, vectors: Arc<dyn VectorIndex>, chat: Arc<ChatLog>) -> Self {
        Self { graph, vectors, chat }
    }

    /// Remove every trace of a brain. Each backend is attempted even when an
    /// earlier one fails, so one unreachable store cannot strand data in the
    /// others; the first error is reported after all attempts.
    pub fn delete_brain(&self, brain_id: &str) -> Result<()> {
        let mut first_error = None;

        if let Err(e) = self.graph.delete_brain(brain_id) {
            error!("graph delete failed for brain {}: {}", brain_id, e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.vectors.drop_collection(brain_id) {
            error!("vector drop failed for brain {}: {}", brain_id, e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.chat.delete_by_brain(brain_id) {
            error!("chat clear failed for brain {}: {}", brain_id, e);
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("deleted brain {}", brain_id);
                Ok(())
            }
        }
    }

    /// Remove one source's contribution. The graph decides which nodes are
    /// fully gone (no descriptions left from any source) and only those lose
    /// their vectors; nodes still backed by another source keep theirs.
    pub fn delete_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>> {
        let removed = self.graph.delete_by_source(source_id, brain_id)?;
        self.vectors.delete_nodes(&removed, brain_id)?;
        info!(
            "deleted source {} from brain {}: {} nodes removed",
            source_id,
            brain_id,
            removed.len()
        );
        Ok(removed)
    }
}
