//! Error types for Cerebro.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Graph store error: {0}")]
    GraphStore(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("No nodes similar to the question were found")]
    NoSimilarNodes,

    #[error("Schema lookup returned no nodes or edges")]
    SchemaNotFound,

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Collaborator timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Terminal, user-facing conditions: the request is answered with
    /// "nothing found" rather than a server fault.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::NoSimilarNodes | Error::SchemaNotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
