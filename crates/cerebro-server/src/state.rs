//! Shared application state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use cerebro_core::{CerebroConfig, SourceDescriptor};
use cerebro_llm::{AnswerSynthesizer, GraphExtractor, TextEmbedder};
use cerebro_pipeline::{IngestionCoordinator, RetrievalPipeline, TenantLifecycle};
use cerebro_store::{ChatLog, GraphStore, VectorIndex};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: CerebroConfig,
    pub graph: Arc<dyn GraphStore>,
    pub chat: Arc<ChatLog>,
    pub ingestion: IngestionCoordinator,
    pub retrieval: RetrievalPipeline,
    pub lifecycle: TenantLifecycle,
    /// Source registry per brain, persisted as JSON next to the databases.
    sources: RwLock<HashMap<String, Vec<SourceDescriptor>>>,
    sources_file: PathBuf,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: CerebroConfig,
        graph: Arc<dyn GraphStore>,
        vectors: Arc<dyn VectorIndex>,
        chat: Arc<ChatLog>,
        extractor: Arc<dyn GraphExtractor>,
        embedder: Arc<dyn TextEmbedder>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
    ) -> Self {
        let sources_file = config.data_paths.root.join("sources.json");
        let sources = Self::load_sources(&sources_file);

        let ingestion = IngestionCoordinator::new(
            graph.clone(),
            vectors.clone(),
            extractor,
            embedder.clone(),
        );
        let retrieval = RetrievalPipeline::new(
            graph.clone(),
            vectors.clone(),
            chat.clone(),
            embedder,
            synthesizer,
            config.similar_node_limit,
        );
        let lifecycle = TenantLifecycle::new(graph.clone(), vectors, chat.clone());

        Self {
            config,
            graph,
            chat,
            ingestion,
            retrieval,
            lifecycle,
            sources: RwLock::new(sources),
            sources_file,
        }
    }

    fn load_sources(path: &std::path::Path) -> HashMap<String, Vec<SourceDescriptor>> {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn save_sources(&self) {
        let sources = self.sources.read();
        if let Ok(data) = serde_json::to_string_pretty(&*sources) {
            let _ = std::fs::write(&self.sources_file, data);
        }
    }

    /// Record a source for a brain, replacing any prior entry with the same id.
    pub fn register_source(&self, brain_id: &str, descriptor: SourceDescriptor) {
        {
            let mut sources = self.sources.write();
            let entries = sources.entry(brain_id.to_string()).or_default();
            entries.retain(|s| s.id != descriptor.id);
            entries.push(descriptor);
        }
        self.save_sources();
    }

    pub fn sources_of(&self, brain_id: &str) -> Vec<SourceDescriptor> {
        self.sources.read().get(brain_id).cloned().unwrap_or_default()
    }

    pub fn forget_source(&self, brain_id: &str, source_id: &str) {
        {
            let mut sources = self.sources.write();
            if let Some(entries) = sources.get_mut(brain_id) {
                entries.retain(|s| s.id != source_id);
            }
        }
        self.save_sources();
    }

    pub fn forget_brain(&self, brain_id: &str) {
        self.sources.write().remove(brain_id);
        self.save_sources();
    }
}
