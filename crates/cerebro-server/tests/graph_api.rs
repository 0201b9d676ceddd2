//! End-to-end HTTP tests over the router with fake collaborators: verifies
//! the response shapes and status codes the API promises.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use cerebro_core::config::LlmSettings;
use cerebro_core::{CerebroConfig, DataPaths, Result};
use cerebro_llm::{
    AnswerSynthesizer, ExtractedEdge, ExtractedNode, Extraction, GraphExtractor, TextEmbedder,
};

const DIM: usize = 16;

struct BagEmbedder;

#[async_trait]
impl TextEmbedder for BagEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIM];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % DIM;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

struct FixedExtractor;

#[async_trait]
impl GraphExtractor for FixedExtractor {
    async fn extract(&self, _text: &str, _source_id: &str) -> Result<Extraction> {
        Ok(Extraction {
            nodes: vec![
                ExtractedNode { name: "Paris".into(), description: "capital of France".into() },
                ExtractedNode { name: "France".into(), description: "a country".into() },
            ],
            edges: vec![ExtractedEdge {
                source: "Paris".into(),
                target: "France".into(),
                relation: "capital_of".into(),
            }],
        })
    }
}

struct FixedSynthesizer;

#[async_trait]
impl AnswerSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, _schema_text: &str, _question: &str) -> Result<String> {
        Ok("Paris. EOF\nREF: Paris".into())
    }
}

fn test_app(dir: &tempfile::TempDir) -> Router {
    let config = CerebroConfig {
        port: 0,
        data_paths: DataPaths::new(dir.path()).unwrap(),
        embedding_dim: DIM,
        similar_node_limit: 5,
        llm: LlmSettings::default(),
    };

    let graph = Arc::new(cerebro_store::SqliteGraphStore::open(&config.data_paths.graph_db).unwrap());
    let vectors = Arc::new(
        cerebro_store::SqliteVectorIndex::open(&config.data_paths.vector_db, DIM).unwrap(),
    );
    let chat = Arc::new(cerebro_store::ChatLog::open(&config.data_paths.chat_db).unwrap());

    let state = Arc::new(cerebro_server::AppState::new(
        config,
        graph,
        vectors,
        chat,
        Arc::new(FixedExtractor),
        Arc::new(BagEmbedder),
        Arc::new(FixedSynthesizer),
    ));
    cerebro_server::build_router(state)
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_ingest_then_answer() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let (status, body) = request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "title": "Geography notes",
            "brain_id": "b1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"], 2);
    assert_eq!(body["edges"], 1);

    let (status, body) = request(
        &app,
        "POST",
        "/graph/answer",
        Some(serde_json::json!({
            "question": "What is the capital of France?",
            "brain_id": "b1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().starts_with("Paris."));
    assert_eq!(body["referenced_nodes"], serde_json::json!(["Paris"]));
    assert!(body["chat_id"].is_number());
}

#[tokio::test]
async fn test_answer_on_empty_brain_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let (status, body) = request(
        &app,
        "POST",
        "/graph/answer",
        Some(serde_json::json!({ "question": "anything?", "brain_id": "empty" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_graph_view_empty_brain_is_200() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let (status, body) = request(&app, "GET", "/graph/never-written", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"], serde_json::json!([]));
    assert_eq!(body["links"], serde_json::json!([]));
}

#[tokio::test]
async fn test_metrics_and_source_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "brain_id": "b1",
        })),
    )
    .await;

    let (status, body) = request(&app, "GET", "/graph/metrics/b1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_nodes"], 2);
    assert_eq!(body["total_edges"], 1);
    assert_eq!(body["sources"][0]["source_id"], "s1");
    assert_eq!(body["sources"][0]["node_count"], 2);

    let (status, body) = request(&app, "GET", "/graph/b1/sources/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"], serde_json::json!(["France", "Paris"]));
    assert_eq!(body["edges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_node_sources_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "title": "Geography notes",
            "brain_id": "b1",
        })),
    )
    .await;
    // Same source again: the node gains a second description from s1,
    // which must not duplicate the source entry.
    request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "title": "Geography notes",
            "brain_id": "b1",
        })),
    )
    .await;

    let (status, body) = request(&app, "GET", "/graph/b1/nodes/Paris/sources", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node"], "Paris");
    assert_eq!(
        body["sources"],
        serde_json::json!([{ "id": "s1", "title": "Geography notes" }])
    );

    let (status, body) = request(&app, "GET", "/graph/b1/nodes/Atlantis/sources", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"], serde_json::json!([]));
}

#[tokio::test]
async fn test_delete_brain_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "brain_id": "b1",
        })),
    )
    .await;

    let (status, _body) = request(&app, "DELETE", "/brains/b1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "GET", "/graph/b1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"], serde_json::json!([]));

    let (_status, body) = request(&app, "GET", "/graph/metrics/b1", None).await;
    assert_eq!(body["sources"], serde_json::json!([]));

    let (status, body) = request(&app, "GET", "/chat/b1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_delete_source_reports_removed_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    request(
        &app,
        "POST",
        "/graph/process_text",
        Some(serde_json::json!({
            "text": "Paris is the capital of France.",
            "source_id": "s1",
            "brain_id": "b1",
        })),
    )
    .await;

    let (status, body) = request(&app, "DELETE", "/brains/b1/sources/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_nodes"], serde_json::json!(["France", "Paris"]));

    let (_status, body) = request(&app, "GET", "/graph/b1", None).await;
    assert_eq!(body["nodes"], serde_json::json!([]));
}
