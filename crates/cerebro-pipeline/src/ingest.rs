//! Ingestion coordinator: text → extraction → graph + vector writes.

use std::sync::Arc;

use tracing::info;

use cerebro_core::{Edge, Result};
use cerebro_llm::{Extraction, GraphExtractor, TextEmbedder};
use cerebro_store::{GraphStore, VectorIndex};

/// Drives one ingestion: the extraction collaborator first, then the graph
/// store, then the vector index. The coordinator is the sole writer of
/// nodes, edges and embedding records.
pub struct IngestionCoordinator {
    graph: Arc<dyn GraphStore>,
    vectors: Arc<dyn VectorIndex>,
    extractor: Arc<dyn GraphExtractor>,
    embedder: Arc<dyn TextEmbedder>,
}

impl IngestionCoordinator {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        vectors: Arc<dyn VectorIndex>,
        extractor: Arc<dyn GraphExtractor>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Self {
        Self { graph, vectors, extractor, embedder }
    }

    /// Ingest one source text into a brain.
    ///
    /// Extraction failure aborts before any store write. A failure after the
    /// graph writes is surfaced without rollback; re-ingesting the same
    /// source converges because node upserts append and vector upserts
    /// replace.
    pub async fn ingest(&self, text: &str, source_id: &str, brain_id: &str) -> Result<Extraction> {
        let extraction = self.extractor.extract(text, source_id).await?;

        for node in &extraction.nodes {
            self.graph.upsert_node(&node.name, &node.description, source_id, brain_id)?;
        }
        for edge in &extraction.edges {
            self.graph.upsert_edge(
                &Edge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    relation: edge.relation.clone(),
                    source_id: source_id.to_string(),
                },
                brain_id,
            )?;
        }

        if !self.vectors.collection_exists(brain_id)? {
            self.vectors.create_collection(brain_id)?;
        }
        for node in &extraction.nodes {
            let vector = self
                .embedder
                .embed(&format!("{}: {}", node.name, node.description))
                .await?;
            self.vectors.upsert(&node.name, &vector, source_id, brain_id)?;
        }

        info!(
            "ingested source {} into brain {}: {} nodes, {} edges",
            source_id,
            brain_id,
            extraction.nodes.len(),
            extraction.edges.len()
        );
        Ok(extraction)
    }
}
