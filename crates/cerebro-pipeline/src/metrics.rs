//! Per-source graph footprint metrics.

use std::sync::Arc;

use tracing::warn;

use cerebro_core::{Result, SourceDescriptor, SourceMetric};
use cerebro_store::GraphStore;

/// Aggregate metrics for one brain.
#[derive(Debug)]
pub struct MetricsReport {
    pub total_text_length: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
    /// One entry per requested source, in request order. A source whose
    /// lookup failed is carried as `Err` so the caller can report it without
    /// losing the rest of the aggregate.
    pub per_source: Vec<Result<SourceMetric>>,
}

/// Collect per-source metrics. One source failing never aborts the whole
/// report; its error is logged and recorded in place.
pub fn collect_source_metrics(
    graph: &Arc<dyn GraphStore>,
    brain_id: &str,
    sources: &[SourceDescriptor],
) -> Result<MetricsReport> {
    let full = graph.full_graph(brain_id)?;

    let mut per_source = Vec::with_capacity(sources.len());
    let mut total_text_length = 0usize;
    for source in sources {
        let text_length = source.text_length.unwrap_or(0);
        total_text_length += text_length;
        per_source.push(source_metric(graph, brain_id, source, text_length));
    }

    Ok(MetricsReport {
        total_text_length,
        total_nodes: full.nodes.len(),
        total_edges: full.links.len(),
        per_source,
    })
}

fn source_metric(
    graph: &Arc<dyn GraphStore>,
    brain_id: &str,
    source: &SourceDescriptor,
    text_length: usize,
) -> Result<SourceMetric> {
    let metric = (|| -> Result<SourceMetric> {
        let nodes = graph.nodes_by_source(&source.id, brain_id)?;
        let edges = graph.edges_by_source(&source.id, brain_id)?;
        Ok(SourceMetric {
            source_id: source.id.clone(),
            title: source.title.clone(),
            text_length,
            node_count: nodes.len(),
            edge_count: edges.len(),
        })
    })();
    if let Err(e) = &metric {
        warn!("metrics lookup failed for source {}: {}", source.id, e);
    }
    metric
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestionCoordinator;
    use crate::testutil::*;
    use cerebro_core::{Edge, Error, FullGraph, GraphSchema, NodeDescription};
    use cerebro_store::SqliteGraphStore;

    fn descriptor(id: &str, title: &str, len: usize) -> SourceDescriptor {
        SourceDescriptor { id: id.into(), title: title.into(), text_length: Some(len) }
    }

    #[tokio::test]
    async fn test_report_totals_and_per_source() {
        let (graph, vectors, _chat) = stores();
        let coordinator = IngestionCoordinator::new(
            graph.clone(),
            vectors,
            Arc::new(FakeExtractor::paris()),
            Arc::new(BagOfWordsEmbedder),
        );
        coordinator.ingest("some text", "s1", "b1").await.unwrap();

        let graph: Arc<dyn GraphStore> = graph;
        let sources = vec![descriptor("s1", "First", 9), descriptor("s2", "Empty", 4)];
        let report = collect_source_metrics(&graph, "b1", &sources).unwrap();

        assert_eq!(report.total_text_length, 13);
        assert_eq!(report.total_nodes, 2);
        assert_eq!(report.total_edges, 1);

        let first = report.per_source[0].as_ref().unwrap();
        assert_eq!(first.node_count, 2);
        assert_eq!(first.edge_count, 1);
        assert_eq!(first.title, "First");

        // A source the graph never saw still yields a metric, just zeroed.
        let second = report.per_source[1].as_ref().unwrap();
        assert_eq!(second.node_count, 0);
        assert_eq!(second.edge_count, 0);
        assert_eq!(second.text_length, 4);
    }

    /// Graph store whose per-source lookups fail for one poisoned id.
    struct FlakyGraph {
        inner: SqliteGraphStore,
        poisoned: String,
    }

    impl FlakyGraph {
        fn check(&self, source_id: &str) -> Result<()> {
            if source_id == self.poisoned {
                return Err(Error::GraphStore("backend unavailable".into()));
            }
            Ok(())
        }
    }

    impl GraphStore for FlakyGraph {
        fn upsert_node(&self, name: &str, description: &str, source_id: &str, brain_id: &str) -> Result<()> {
            self.inner.upsert_node(name, description, source_id, brain_id)
        }
        fn upsert_edge(&self, edge: &Edge, brain_id: &str) -> Result<()> {
            self.inner.upsert_edge(edge, brain_id)
        }
        fn full_graph(&self, brain_id: &str) -> Result<FullGraph> {
            self.inner.full_graph(brain_id)
        }
        fn two_hop_schema(&self, seed_names: &[String], brain_id: &str) -> Result<GraphSchema> {
            self.inner.two_hop_schema(seed_names, brain_id)
        }
        fn descriptions(&self, node_name: &str, brain_id: &str) -> Result<Vec<NodeDescription>> {
            self.inner.descriptions(node_name, brain_id)
        }
        fn nodes_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>> {
            self.check(source_id)?;
            self.inner.nodes_by_source(source_id, brain_id)
        }
        fn edges_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<Edge>> {
            self.check(source_id)?;
            self.inner.edges_by_source(source_id, brain_id)
        }
        fn delete_by_source(&self, source_id: &str, brain_id: &str) -> Result<Vec<String>> {
            self.inner.delete_by_source(source_id, brain_id)
        }
        fn delete_brain(&self, brain_id: &str) -> Result<()> {
            self.inner.delete_brain(brain_id)
        }
    }

    #[test]
    fn test_one_failing_source_never_aborts_the_report() {
        let flaky = FlakyGraph {
            inner: SqliteGraphStore::open_in_memory().unwrap(),
            poisoned: "bad".into(),
        };
        flaky.upsert_node("X", "a node", "good", "b1").unwrap();

        let graph: Arc<dyn GraphStore> = Arc::new(flaky);
        let sources = vec![descriptor("good", "Good", 5), descriptor("bad", "Bad", 7)];
        let report = collect_source_metrics(&graph, "b1", &sources).unwrap();

        assert_eq!(report.per_source.len(), 2);
        assert!(report.per_source[0].is_ok());
        assert!(matches!(report.per_source[1], Err(Error::GraphStore(_))));
        // Totals still include the failing source's declared text length.
        assert_eq!(report.total_text_length, 12);
        assert_eq!(report.total_nodes, 1);
    }
}
