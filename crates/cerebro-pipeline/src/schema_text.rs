//! Deterministic textual serialization of a retrieval schema.
//!
//! The schema text is the only graph context the synthesizer sees, so
//! identical inputs must always produce identical text: seed nodes first in
//! seed order, then related nodes (already name-sorted by the graph store),
//! then edges grouped by source node in name order.

use std::collections::BTreeMap;

use cerebro_core::{GraphSchema, Node};

/// Render a schema for the synthesis collaborator.
pub fn schema_text(schema: &GraphSchema) -> String {
    let mut out = String::new();

    out.push_str("Nodes:\n");
    for node in &schema.nodes {
        push_node(&mut out, node);
    }

    if !schema.related_nodes.is_empty() {
        out.push_str("Related nodes:\n");
        for node in &schema.related_nodes {
            push_node(&mut out, node);
        }
    }

    if !schema.edges.is_empty() {
        // Group by source node; within a group order by target then relation.
        let mut grouped: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for edge in &schema.edges {
            grouped
                .entry(edge.source.as_str())
                .or_default()
                .push((edge.target.as_str(), edge.relation.as_str()));
        }
        out.push_str("Edges:\n");
        for (source, mut pairs) in grouped {
            pairs.sort_unstable();
            pairs.dedup();
            for (target, relation) in pairs {
                out.push_str(&format!("- {} -[{}]-> {}\n", source, relation, target));
            }
        }
    }

    out
}

fn push_node(out: &mut String, node: &Node) {
    let descriptions: Vec<String> = node
        .descriptions
        .iter()
        .map(|d| d.text.clone())
        .collect();
    out.push_str(&format!("- {}: {}\n", node.name, descriptions.join("; ")));
}
