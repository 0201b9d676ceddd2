//! Fake collaborators and store setup shared by the pipeline tests.

use std::sync::Arc;

use async_trait::async_trait;

use cerebro_core::{Error, Result};
use cerebro_llm::{AnswerSynthesizer, ExtractedEdge, ExtractedNode, Extraction, GraphExtractor, TextEmbedder};
use cerebro_store::{ChatLog, SqliteGraphStore, SqliteVectorIndex};

pub const TEST_DIM: usize = 16;

pub fn stores() -> (Arc<SqliteGraphStore>, Arc<SqliteVectorIndex>, Arc<ChatLog>) {
    (
        Arc::new(SqliteGraphStore::open_in_memory().unwrap()),
        Arc::new(SqliteVectorIndex::open_in_memory(TEST_DIM).unwrap()),
        Arc::new(ChatLog::open_in_memory().unwrap()),
    )
}

/// Deterministic bag-of-words embedder: shared words yield similar vectors.
pub struct BagOfWordsEmbedder;

#[async_trait]
impl TextEmbedder for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; TEST_DIM];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % TEST_DIM;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        TEST_DIM
    }
}

/// Extractor returning a pre-programmed result.
pub struct FakeExtractor {
    pub result: Extraction,
}

impl FakeExtractor {
    pub fn paris() -> Self {
        Self {
            result: Extraction {
                nodes: vec![
                    ExtractedNode {
                        name: "Paris".into(),
                        description: "capital of France".into(),
                    },
                    ExtractedNode {
                        name: "France".into(),
                        description: "a country in Europe".into(),
                    },
                ],
                edges: vec![ExtractedEdge {
                    source: "Paris".into(),
                    target: "France".into(),
                    relation: "capital_of".into(),
                }],
            },
        }
    }
}

#[async_trait]
impl GraphExtractor for FakeExtractor {
    async fn extract(&self, _text: &str, _source_id: &str) -> Result<Extraction> {
        Ok(self.result.clone())
    }
}

/// Extractor that always fails with an unparseable-output error.
pub struct FailingExtractor;

#[async_trait]
impl GraphExtractor for FailingExtractor {
    async fn extract(&self, _text: &str, _source_id: &str) -> Result<Extraction> {
        Err(Error::Extraction("unparseable extractor output".into()))
    }
}

/// Synthesizer returning a fixed raw payload.
pub struct FakeSynthesizer {
    pub raw: String,
}

#[async_trait]
impl AnswerSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _schema_text: &str, _question: &str) -> Result<String> {
        Ok(self.raw.clone())
    }
}

/// Synthesizer that always fails.
pub struct FailingSynthesizer;

#[async_trait]
impl AnswerSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _schema_text: &str, _question: &str) -> Result<String> {
        Err(Error::Synthesis("provider unavailable".into()))
    }
}
