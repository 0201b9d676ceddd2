//! Cerebro Pipeline — ingestion coordination, retrieval, tenant lifecycle
//! and per-source metrics over the graph store and vector index.

pub mod answer;
pub mod ingest;
pub mod lifecycle;
pub mod metrics;
pub mod schema_text;

pub use answer::{AnswerOutcome, RetrievalPipeline};
pub use ingest::IngestionCoordinator;
pub use lifecycle::TenantLifecycle;
pub use metrics::{collect_source_metrics, MetricsReport};
pub use schema_text::schema_text;

#[cfg(test)]
pub(crate) mod testutil;
