//! Graph routes: ingestion, question answering, graph views and metrics.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::routes::ApiError;
use crate::state::AppState;
use cerebro_core::SourceDescriptor;
use cerebro_pipeline::collect_source_metrics;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/graph/process_text", post(process_text))
        .route("/graph/answer", post(answer))
        .route("/graph/metrics/{brain_id}", get(get_metrics))
        .route("/graph/{brain_id}", get(get_graph))
        .route("/graph/{brain_id}/sources/{source_id}", get(get_source))
        .route("/graph/{brain_id}/nodes/{node_name}/sources", get(get_node_sources))
}

// ---------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProcessTextRequest {
    text: String,
    source_id: String,
    #[serde(default)]
    title: Option<String>,
    brain_id: String,
}

/// POST /graph/process_text — extract a graph from text and index it.
async fn process_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessTextRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let extraction = state
        .ingestion
        .ingest(&req.text, &req.source_id, &req.brain_id)
        .await?;

    state.register_source(
        &req.brain_id,
        SourceDescriptor {
            id: req.source_id.clone(),
            title: req.title.unwrap_or_else(|| req.source_id.clone()),
            text_length: Some(req.text.chars().count()),
        },
    );

    Ok(Json(json!({
        "source_id": req.source_id,
        "nodes": extraction.nodes.len(),
        "edges": extraction.edges.len(),
    })))
}

// ---------------------------------------------------------------
// Answering
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    question: String,
    brain_id: String,
}

/// POST /graph/answer — answer a question against one brain's graph.
async fn answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.retrieval.answer(&req.question, &req.brain_id).await?;
    Ok(Json(json!({
        "answer": outcome.answer,
        "referenced_nodes": outcome.referenced_nodes,
        "chat_id": outcome.chat_id,
    })))
}

// ---------------------------------------------------------------
// Views
// ---------------------------------------------------------------

/// GET /graph/{brain_id} — whole-brain node/link view. A brain that was
/// never written to yields empty arrays, not a 404.
async fn get_graph(
    State(state): State<Arc<AppState>>,
    Path(brain_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let full = state.graph.full_graph(&brain_id)?;
    Ok(Json(json!({
        "nodes": full.nodes,
        "links": full.links,
    })))
}

/// GET /graph/{brain_id}/sources/{source_id} — one source's graph footprint.
async fn get_source(
    State(state): State<Arc<AppState>>,
    Path((brain_id, source_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let nodes = state.graph.nodes_by_source(&source_id, &brain_id)?;
    let edges = state.graph.edges_by_source(&source_id, &brain_id)?;
    let descriptor = state
        .sources_of(&brain_id)
        .into_iter()
        .find(|s| s.id == source_id);
    Ok(Json(json!({
        "source": descriptor,
        "nodes": nodes,
        "edges": edges,
    })))
}

/// GET /graph/{brain_id}/nodes/{node_name}/sources — the sources whose
/// descriptions mention a node, deduplicated in first-mention order, with
/// titles from the source registry where known.
async fn get_node_sources(
    State(state): State<Arc<AppState>>,
    Path((brain_id, node_name)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let descriptions = state.graph.descriptions(&node_name, &brain_id)?;
    let registry = state.sources_of(&brain_id);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut sources: Vec<serde_json::Value> = Vec::new();
    for description in &descriptions {
        if seen.insert(description.source_id.as_str()) {
            let title = registry
                .iter()
                .find(|s| s.id == description.source_id)
                .map(|s| s.title.clone());
            sources.push(json!({ "id": description.source_id, "title": title }));
        }
    }

    Ok(Json(json!({ "node": node_name, "sources": sources })))
}

/// GET /graph/metrics/{brain_id} — aggregate and per-source metrics. A
/// source whose lookup failed is reported in place of its metric.
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Path(brain_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sources = state.sources_of(&brain_id);
    let report = collect_source_metrics(&state.graph, &brain_id, &sources)?;

    let per_source: Vec<serde_json::Value> = report
        .per_source
        .iter()
        .zip(&sources)
        .map(|(entry, source)| match entry {
            Ok(metric) => json!(metric),
            Err(e) => json!({ "source_id": source.id, "error": e.to_string() }),
        })
        .collect();

    Ok(Json(json!({
        "total_text_length": report.total_text_length,
        "total_nodes": report.total_nodes,
        "total_edges": report.total_edges,
        "sources": per_source,
    })))
}
