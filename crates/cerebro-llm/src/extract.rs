//! Graph extraction collaborator: free text → nodes and edges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cerebro_core::{Error, Result};

/// A node produced by one extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedNode {
    pub name: String,
    pub description: String,
}

/// An edge produced by one extraction call. The source id of the ingestion
/// is attached by the coordinator, not the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Output contract of the extraction collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub nodes: Vec<ExtractedNode>,
    pub edges: Vec<ExtractedEdge>,
}

/// External function turning raw text into a node/edge set.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    /// Extract graph components from `text`. An unparseable model response
    /// surfaces as [`Error::Extraction`]; the caller may retry, the
    /// collaborator itself does not.
    async fn extract(&self, text: &str, source_id: &str) -> Result<Extraction>;
}

/// Parse a model response into an [`Extraction`].
///
/// Accepts the raw JSON object, optionally wrapped in a Markdown code fence.
/// Empty node names are dropped; an edge endpoint missing from the node set
/// is still kept (the graph store tolerates dangling names).
pub fn parse_extraction(raw: &str) -> Result<Extraction> {
    let body = strip_code_fence(raw);
    let mut extraction: Extraction = serde_json::from_str(body)
        .map_err(|e| Error::Extraction(format!("unparseable extractor output: {}", e)))?;
    extraction.nodes.retain(|n| !n.name.trim().is_empty());
    extraction
        .edges
        .retain(|e| !e.source.trim().is_empty() && !e.target.trim().is_empty());
    Ok(extraction)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
