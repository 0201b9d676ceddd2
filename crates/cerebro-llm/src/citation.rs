//! Citation mini-protocol parser for raw synthesis output.
//!
//! The synthesizer is prompted to emit:
//!
//! ```text
//! <answer text> EOF
//! REF: <node name>
//! REF: <node name>
//! ```
//!
//! The user-facing answer is everything before the FIRST `EOF` occurrence,
//! whitespace-trimmed. Referenced nodes are read from `REF:` lines anywhere
//! in the raw (pre-truncation) output, in order of appearance, de-duplicated.
//! This is a hard parsing contract: content after the sentinel is discarded
//! even when it looks like answer text.

/// Sentinel ending the user-facing answer.
pub const ANSWER_SENTINEL: &str = "EOF";

/// Line prefix marking one referenced node.
pub const REFERENCE_PREFIX: &str = "REF:";

/// Parsed synthesis payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutput {
    /// Answer text before the sentinel, trimmed.
    pub answer: String,
    /// Referenced node names in order of appearance, without duplicates.
    pub referenced: Vec<String>,
}

/// Split a raw synthesis payload into answer and citations.
pub fn parse_synthesis(raw: &str) -> SynthesisOutput {
    let answer = match raw.find(ANSWER_SENTINEL) {
        Some(idx) => raw[..idx].trim().to_string(),
        None => raw.trim().to_string(),
    };

    let mut referenced: Vec<String> = Vec::new();
    for line in raw.lines() {
        if let Some(name) = line.trim().strip_prefix(REFERENCE_PREFIX) {
            let name = name.trim();
            if !name.is_empty() && !referenced.iter().any(|r| r == name) {
                referenced.push(name.to_string());
            }
        }
    }

    SynthesisOutput { answer, referenced }
}
