//! Retrieval pipeline: question → seed nodes → bounded subgraph → answer.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::schema_text::schema_text;
use cerebro_core::{Error, Result};
use cerebro_llm::{parse_synthesis, AnswerSynthesizer, TextEmbedder};
use cerebro_store::{ChatLog, GraphStore, VectorIndex};

/// Result of one answered question.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub referenced_nodes: Vec<String>,
    /// Id of the answer chat record (not the question record).
    pub chat_id: i64,
}

/// Answers questions against one brain's graph. Sole writer of chat records.
pub struct RetrievalPipeline {
    graph: Arc<dyn GraphStore>,
    vectors: Arc<dyn VectorIndex>,
    chat: Arc<ChatLog>,
    embedder: Arc<dyn TextEmbedder>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    similar_node_limit: usize,
}

impl RetrievalPipeline {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        vectors: Arc<dyn VectorIndex>,
        chat: Arc<ChatLog>,
        embedder: Arc<dyn TextEmbedder>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
        similar_node_limit: usize,
    ) -> Self {
        Self { graph, vectors, chat, embedder, synthesizer, similar_node_limit }
    }

    /// Answer a question. The question is logged before any retrieval, so a
    /// failed attempt remains auditable; the answer record is only written
    /// on success and its id is what callers get back.
    pub async fn answer(&self, question: &str, brain_id: &str) -> Result<AnswerOutcome> {
        self.chat.save(false, question, brain_id, None)?;

        // A brand-new brain gets an empty collection, which then yields the
        // terminal no-similar-nodes outcome rather than a backend error.
        if !self.vectors.collection_exists(brain_id)? {
            self.vectors.create_collection(brain_id)?;
        }

        let question_vector = self.embedder.embed(question).await?;
        let hits = self
            .vectors
            .search(&question_vector, brain_id, self.similar_node_limit)?;
        if hits.is_empty() {
            return Err(Error::NoSimilarNodes);
        }
        let seed_names: Vec<String> = hits.into_iter().map(|h| h.name).collect();
        debug!("seed nodes for brain {}: {:?}", brain_id, seed_names);

        let schema = self.graph.two_hop_schema(&seed_names, brain_id)?;
        if schema.is_empty() {
            return Err(Error::SchemaNotFound);
        }

        let raw = self
            .synthesizer
            .synthesize(&schema_text(&schema), question)
            .await?;

        let parsed = parse_synthesis(&raw);
        // Citations are validated against the retrieved node set; anything
        // the synthesizer invented is dropped silently.
        let retrieved: HashSet<&str> = schema.node_names().into_iter().collect();
        let referenced: Vec<String> = parsed
            .referenced
            .into_iter()
            .filter(|name| retrieved.contains(name.as_str()))
            .collect();

        let mut answer = parsed.answer;
        if !referenced.is_empty() {
            answer.push_str("\n\n[Referenced nodes]");
            for name in &referenced {
                answer.push_str(&format!("\n- {}", name));
            }
        }

        let chat_id = self.chat.save(true, &answer, brain_id, Some(&referenced))?;
        info!(
            "answered question for brain {}: {} referenced nodes, chat_id={}",
            brain_id,
            referenced.len(),
            chat_id
        );
        Ok(AnswerOutcome { answer, referenced_nodes: referenced, chat_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestionCoordinator;
    use crate::testutil::*;

    struct Setup {
        pipeline: RetrievalPipeline,
        coordinator: IngestionCoordinator,
        chat: Arc<ChatLog>,
    }

    fn setup(raw_synthesis: &str) -> Setup {
        setup_with(Arc::new(FakeSynthesizer { raw: raw_synthesis.to_string() }))
    }

    fn setup_with(synthesizer: Arc<dyn AnswerSynthesizer>) -> Setup {
        let (graph, vectors, chat) = stores();
        let coordinator = IngestionCoordinator::new(
            graph.clone(),
            vectors.clone(),
            Arc::new(FakeExtractor::paris()),
            Arc::new(BagOfWordsEmbedder),
        );
        let pipeline = RetrievalPipeline::new(
            graph,
            vectors,
            chat.clone(),
            Arc::new(BagOfWordsEmbedder),
            synthesizer,
            5,
        );
        Setup { pipeline, coordinator, chat }
    }

    #[tokio::test]
    async fn test_end_to_end_paris() {
        let s = setup("Paris is the capital of France. EOF\nREF: Paris\nREF: France");
        s.coordinator
            .ingest("Paris is the capital of France.", "s1", "b1")
            .await
            .unwrap();

        let outcome = s
            .pipeline
            .answer("What is the capital of France?", "b1")
            .await
            .unwrap();

        assert!(outcome.answer.starts_with("Paris is the capital of France."));
        assert!(outcome.answer.contains("[Referenced nodes]"));
        assert_eq!(outcome.referenced_nodes, vec!["Paris", "France"]);

        // Two chat rows: the question, then the answer whose id we returned.
        let history = s.chat.history("b1").unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_answer);
        assert!(history[1].is_answer);
        assert_eq!(history[1].id, outcome.chat_id);
    }

    #[tokio::test]
    async fn test_sentinel_truncation_in_answer() {
        let s = setup("The answer is 42.EOFignored-trailing-text\nREF: Paris");
        s.coordinator.ingest("text", "s1", "b1").await.unwrap();

        let outcome = s.pipeline.answer("capital of France?", "b1").await.unwrap();
        assert!(outcome.answer.starts_with("The answer is 42."));
        assert!(!outcome.answer.contains("ignored-trailing-text"));
    }

    #[tokio::test]
    async fn test_hallucinated_citations_are_dropped() {
        let s = setup("An answer. EOF\nREF: Paris\nREF: Atlantis");
        s.coordinator.ingest("text", "s1", "b1").await.unwrap();

        let outcome = s.pipeline.answer("capital of France?", "b1").await.unwrap();
        assert_eq!(outcome.referenced_nodes, vec!["Paris"]);
        assert!(!outcome.answer.contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_no_references_no_block() {
        let s = setup("An answer without citations. EOF");
        s.coordinator.ingest("text", "s1", "b1").await.unwrap();

        let outcome = s.pipeline.answer("capital of France?", "b1").await.unwrap();
        assert!(!outcome.answer.contains("[Referenced nodes]"));
        assert!(outcome.referenced_nodes.is_empty());
    }

    #[tokio::test]
    async fn test_empty_brain_is_terminal_not_an_error() {
        let s = setup("unused");
        let err = s.pipeline.answer("anything?", "fresh").await.unwrap_err();
        assert!(matches!(err, Error::NoSimilarNodes));
        assert!(err.is_terminal());

        // The question was still logged, and the lazy init stuck.
        let history = s.chat.history("fresh").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "anything?");
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_question_record() {
        let s = setup_with(Arc::new(FailingSynthesizer));
        s.coordinator.ingest("text", "s1", "b1").await.unwrap();

        let err = s.pipeline.answer("capital of France?", "b1").await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));

        let history = s.chat.history("b1").unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_answer);
    }
}
