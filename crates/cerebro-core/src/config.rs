//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all Cerebro data files.
///
/// The graph store, vector index and chat log live in separate SQLite files
/// so that each backend can fail (or be rebuilt) independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Graph store database (`data/graph.db`).
    pub graph_db: PathBuf,
    /// Vector index database (`data/vectors.db`).
    pub vector_db: PathBuf,
    /// Chat log database (`data/chat.db`).
    pub chat_db: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            graph_db: root.join("graph.db"),
            vector_db: root.join("vectors.db"),
            chat_db: root.join("chat.db"),
            root,
        })
    }
}

/// Settings for the OpenAI-compatible collaborator endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the API (e.g., `https://api.openai.com/v1`).
    pub api_base: String,
    /// API key. Absent means the collaborators are unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Chat model used for extraction and synthesis.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            api_key: None,
            chat_model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
            timeout_secs: 60,
        }
    }
}

/// Top-level Cerebro configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CerebroConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data file paths.
    pub data_paths: DataPaths,
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// Fixed top-k for the similarity search that seeds retrieval.
    pub similar_node_limit: usize,
    /// Collaborator endpoint settings.
    pub llm: LlmSettings,
}

impl CerebroConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3007);

        let data_paths = DataPaths::new(data_dir)?;

        let mut llm = LlmSettings::default();
        if let Ok(base) = std::env::var("CEREBRO_API_BASE") {
            llm.api_base = base;
        }
        llm.api_key = std::env::var("CEREBRO_API_KEY").ok();
        if let Ok(model) = std::env::var("CEREBRO_CHAT_MODEL") {
            llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("CEREBRO_EMBEDDING_MODEL") {
            llm.embedding_model = model;
        }

        Ok(Self {
            port,
            data_paths,
            embedding_dim: 384,
            similar_node_limit: 5,
            llm,
        })
    }
}
