//! Cerebro — per-tenant knowledge graph ingestion and retrieval server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cerebro_server::{build_router, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("CEREBRO_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = cerebro_core::CerebroConfig::from_env(&data_dir)?;
    let port = config.port;

    let graph = Arc::new(
        cerebro_store::SqliteGraphStore::open(&config.data_paths.graph_db)
            .map_err(|e| anyhow::anyhow!("Failed to open graph store: {}", e))?,
    );
    let vectors = Arc::new(
        cerebro_store::SqliteVectorIndex::open(&config.data_paths.vector_db, config.embedding_dim)
            .map_err(|e| anyhow::anyhow!("Failed to open vector index: {}", e))?,
    );
    let chat = Arc::new(
        cerebro_store::ChatLog::open(&config.data_paths.chat_db)
            .map_err(|e| anyhow::anyhow!("Failed to open chat log: {}", e))?,
    );

    // One HTTP client serves as extractor, synthesizer and embedder.
    let llm = Arc::new(
        cerebro_llm::OpenAiClient::new(config.llm.clone(), config.embedding_dim)
            .map_err(|e| anyhow::anyhow!("Failed to build LLM client: {}", e))?,
    );

    let state = Arc::new(AppState::new(
        config,
        graph,
        vectors,
        chat,
        llm.clone(),
        llm.clone(),
        llm,
    ));

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Cerebro server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
