//! HTTP contract tests against a server bound to an ephemeral port, with
//! fake embedding/chat backends and the in-memory index.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use finreport_rag::{
    ChatModel, EmbeddingProvider, IngestionPipeline, MemoryIndex, NO_CONTEXT_ANSWER,
    PipelineConfig, QaEngine, RagError, RecursiveTokenChunker, Result as RagResult, TextExtractor,
    TokenCounter,
};
use finreport_server::api::{ProcessResponse, QuestionResponse};
use finreport_server::server::{AppState, app_router};
use serde_json::{Value, json};

struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> RagResult<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Returns the full prompt so assertions can see the grounding context.
struct EchoChat;

#[async_trait]
impl ChatModel for EchoChat {
    async fn complete(&self, prompt: &str) -> RagResult<String> {
        Ok(prompt.to_string())
    }
}

/// Plain-text extractor that counts invocations, so tests can assert the
/// extension guard rejects uploads before extraction runs.
#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
}

impl TextExtractor for CountingExtractor {
    fn extract(&self, path: &Path) -> RagResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::fs::read_to_string(path).map_err(|e| RagError::Extraction(e.to_string()))
    }
}

/// Spawn the router on an ephemeral port; returns the base URL and the
/// extractor handle for call-count assertions.
async fn spawn_server() -> (String, Arc<CountingExtractor>) {
    let index = Arc::new(MemoryIndex::new());
    let extractor = Arc::new(CountingExtractor::default());
    let embedder = Arc::new(ConstantEmbedder);

    let counter = TokenCounter::new().expect("load cl100k_base");
    let chunker = RecursiveTokenChunker::new(500, 50, counter).expect("valid chunker parameters");

    let pipeline =
        IngestionPipeline::new(extractor.clone(), chunker, embedder.clone(), index.clone());
    let qa = QaEngine::new(embedder, index, Arc::new(EchoChat), PipelineConfig::default());

    let state = AppState { pipeline: Arc::new(pipeline), qa: Arc::new(qa) };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    (format!("http://{addr}"), extractor)
}

fn upload_form(filename: &str, content: &str, user_id: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.as_bytes().to_vec())
        .file_name(filename.to_string());
    reqwest::multipart::Form::new().part("file", part).text("user_id", user_id.to_string())
}

#[tokio::test]
async fn root_reports_liveness() {
    let (base_url, _) = spawn_server().await;

    let response = reqwest::get(&base_url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "API is running");
}

#[tokio::test]
async fn upload_rejects_unrecognized_extensions_before_extraction() {
    let (base_url, extractor) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/api/upload"))
        .multipart(upload_form("report.docx", "not actually a docx", "u1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: ProcessResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert!(body.message.contains("PDF"), "message should name accepted types: {}", body.message);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0, "guard must run before extraction");
}

#[tokio::test]
async fn upload_requires_both_file_and_user_id() {
    let (base_url, _) = spawn_server().await;
    let client = reqwest::Client::new();

    let missing_user = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"some text".to_vec()).file_name("a.txt"),
    );
    let response = client
        .post(format!("{base_url}/api/upload"))
        .multipart(missing_user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let missing_file = reqwest::multipart::Form::new().text("user_id", "u1");
    let response = client
        .post(format!("{base_url}/api/upload"))
        .multipart(missing_file)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn upload_and_question_round_trip() {
    let (base_url, _) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/api/upload"))
        .multipart(upload_form("q1_report.txt", "Revenue was $5M in Q1, up 12%.", "u1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: ProcessResponse = response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.document_id.as_deref(), Some("doc_q1_report.txt_u1"));

    let response = client
        .post(format!("{base_url}/api/question"))
        .json(&json!({ "question": "What was Q1 revenue?", "user_id": "u1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: QuestionResponse = response.json().await.unwrap();
    assert!(body.success);
    // EchoChat returns the prompt, so the uploaded text must be in it.
    assert!(body.answer.contains("$5M"));
    assert_eq!(body.sources.len(), 1);
    assert_eq!(body.sources[0].filename, "q1_report.txt");
}

#[tokio::test]
async fn query_route_is_an_alias_for_question() {
    let (base_url, _) = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base_url}/api/upload"))
        .multipart(upload_form("notes.md", "Gross margin held at 62%.", "u1"))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{base_url}/api/query"))
        .json(&json!({ "question": "What was the margin?", "user_id": "u1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: QuestionResponse = response.json().await.unwrap();
    assert!(body.success);
    assert!(body.answer.contains("62%"));
}

#[tokio::test]
async fn file_id_scopes_the_question_to_one_document() {
    let (base_url, _) = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base_url}/api/upload"))
        .multipart(upload_form("a.txt", "Cash on hand was $9M.", "u1"))
        .send()
        .await
        .unwrap();

    // file_id is accepted as a document_id synonym.
    let response = client
        .post(format!("{base_url}/api/question"))
        .json(&json!({
            "question": "How much cash?",
            "user_id": "u1",
            "file_id": "doc_a.txt_u1"
        }))
        .send()
        .await
        .unwrap();
    let body: QuestionResponse = response.json().await.unwrap();
    assert!(body.answer.contains("$9M"));

    // Scoping to a document the user never uploaded finds nothing.
    let response = client
        .post(format!("{base_url}/api/question"))
        .json(&json!({
            "question": "How much cash?",
            "user_id": "u1",
            "file_id": "doc_missing"
        }))
        .send()
        .await
        .unwrap();
    let body: QuestionResponse = response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.answer, NO_CONTEXT_ANSWER);
    assert!(body.sources.is_empty());
}

#[tokio::test]
async fn questions_are_isolated_per_user() {
    let (base_url, _) = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base_url}/api/upload"))
        .multipart(upload_form("private.txt", "Payroll was $3M.", "u1"))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{base_url}/api/question"))
        .json(&json!({ "question": "What was payroll?", "user_id": "u2" }))
        .send()
        .await
        .unwrap();

    let body: QuestionResponse = response.json().await.unwrap();
    assert_eq!(body.answer, NO_CONTEXT_ANSWER, "another user's documents must stay invisible");
}

#[tokio::test]
async fn documents_listing_is_a_stub() {
    let (base_url, _) = spawn_server().await;

    let response = reqwest::get(format!("{base_url}/api/documents/u1")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["documents"], json!([]));
}
