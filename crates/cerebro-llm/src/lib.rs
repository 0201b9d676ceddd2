//! Cerebro LLM — external collaborator interfaces and their OpenAI-compatible
//! HTTP implementation.
//!
//! Three collaborators are invoked as opaque functions with documented
//! contracts: graph extraction (text → nodes/edges), answer synthesis
//! (schema text + question → raw answer with the citation mini-protocol),
//! and text embedding.

pub mod citation;
pub mod embed;
pub mod extract;
pub mod openai;
pub mod synth;

pub use citation::{parse_synthesis, SynthesisOutput, ANSWER_SENTINEL, REFERENCE_PREFIX};
pub use embed::TextEmbedder;
pub use extract::{parse_extraction, ExtractedEdge, ExtractedNode, Extraction, GraphExtractor};
pub use openai::OpenAiClient;
pub use synth::AnswerSynthesizer;
