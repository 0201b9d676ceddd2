//! Shared domain types for the knowledge graph and chat log.

use serde::{Deserialize, Serialize};

/// One source-attributed description of a node. Descriptions accumulate
/// across ingestions; they are appended, never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub text: String,
    pub source_id: String,
}

/// A named entity in a brain's knowledge graph.
///
/// Identity is `name` (case-sensitive, unique per brain). A node with an
/// empty description list must not exist in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub descriptions: Vec<NodeDescription>,
}

/// A directed, labeled, source-attributed relationship between two nodes.
///
/// Identity within a brain is the full `(source, target, relation, source_id)`
/// tuple; the same pair of nodes may be connected by many edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub source_id: String,
}

/// A similarity search hit. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarNode {
    pub name: String,
    pub score: f32,
}

/// The bounded subgraph handed to answer synthesis: seed nodes (in seed
/// order), nodes reachable within two hops, and every edge incident to a
/// visited node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchema {
    pub nodes: Vec<Node>,
    pub related_nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSchema {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.related_nodes.is_empty() && self.edges.is_empty()
    }

    /// Names of every node in the schema, seeds first.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .chain(self.related_nodes.iter())
            .map(|n| n.name.as_str())
            .collect()
    }
}

/// A node reference in the full-graph view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNodeRef {
    pub name: String,
}

/// An edge in the full-graph view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Whole-brain graph view: the shape returned by the full-graph entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullGraph {
    pub nodes: Vec<GraphNodeRef>,
    pub links: Vec<GraphLink>,
}

/// One row of the append-only chat log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub is_answer: bool,
    pub text: String,
    pub brain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_nodes: Option<Vec<String>>,
    pub created_at: i64,
}

/// A source known to the metadata layer, as handed to metrics collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub title: String,
    /// Character count of the source's text; absent when the text is not
    /// available (e.g., the file was removed from disk).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

/// Per-source graph footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetric {
    pub source_id: String,
    pub title: String,
    pub text_length: usize,
    pub node_count: usize,
    pub edge_count: usize,
}
