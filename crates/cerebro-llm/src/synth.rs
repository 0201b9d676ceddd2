//! Answer synthesis collaborator: schema text + question → raw answer.

use async_trait::async_trait;

use cerebro_core::Result;

/// External function producing the raw answer payload.
///
/// The raw output follows the citation mini-protocol of [`crate::citation`]:
/// the user-facing answer, the `EOF` sentinel, then `REF:` lines naming the
/// graph nodes the answer drew on. Callers must run the output through
/// [`crate::parse_synthesis`] before surfacing it.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, schema_text: &str, question: &str) -> Result<String>;
}
