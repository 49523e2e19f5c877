//! axum HTTP surface over the ingestion pipeline and Q&A engine.

use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use finreport_rag::{IngestionPipeline, QaEngine, recognized_extension};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{ProcessResponse, QuestionRequest, QuestionResponse};

/// Uploads larger than this are rejected by the body limit layer.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handles constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    /// The document ingestion pipeline.
    pub pipeline: Arc<IngestionPipeline>,
    /// The retrieval + answer generation engine.
    pub qa: Arc<QaEngine>,
}

/// Network bind configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5001 }
    }
}

impl ServerConfig {
    /// Read `HOST` and `PORT` from the environment, with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        }
    }
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/upload", post(upload_file))
        .route("/api/question", post(ask_question))
        .route("/api/query", post(ask_question))
        .route("/api/documents/{user_id}", get(user_documents))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process exits.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for finreport server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("finreport server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Liveness probe.
async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "API is running" }))
}

fn upload_failure(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ProcessResponse>) {
    (status, Json(ProcessResponse { success: false, document_id: None, message: message.into() }))
}

/// `POST /api/upload` — multipart `file` + `user_id`.
///
/// The extension guard runs before any extraction attempt. Uploaded bytes
/// live in a temp file that is removed when the handler returns, success
/// or not.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ProcessResponse>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_failure(StatusCode::BAD_REQUEST, format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    upload_failure(StatusCode::BAD_REQUEST, format!("failed to read file field: {e}"))
                })?;
                upload = Some((filename, bytes.to_vec()));
            }
            Some("user_id") => {
                let value = field.text().await.map_err(|e| {
                    upload_failure(StatusCode::BAD_REQUEST, format!("failed to read user_id field: {e}"))
                })?;
                user_id = Some(value);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| upload_failure(StatusCode::BAD_REQUEST, "missing file field"))?;
    let user_id =
        user_id.ok_or_else(|| upload_failure(StatusCode::BAD_REQUEST, "missing user_id field"))?;

    if !recognized_extension(&filename) {
        return Err(upload_failure(
            StatusCode::BAD_REQUEST,
            "Only PDF, TXT, and MD files are accepted",
        ));
    }

    // Keep the original extension so the extractor can dispatch on it. The
    // temp file is deleted on drop regardless of outcome.
    let extension = FsPath::new(&filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix("finreport_upload_")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(|e| {
            upload_failure(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to stage upload: {e}"))
        })?;

    tokio::fs::write(temp.path(), &bytes).await.map_err(|e| {
        upload_failure(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to stage upload: {e}"))
    })?;

    let report =
        state.pipeline.ingest(temp.path(), &user_id, &filename, None).await.map_err(|e| {
            error!(filename, user_id, error = %e, "upload processing failed");
            upload_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing file: {e}"),
            )
        })?;

    Ok(Json(ProcessResponse {
        success: true,
        document_id: Some(report.document_id),
        message: "File processed successfully.".to_string(),
    }))
}

/// `POST /api/question` (and its `/api/query` alias).
///
/// Never fails with a 5xx for retrieval or generation problems; those fall
/// back to fixed answer content inside the engine.
async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Json<QuestionResponse> {
    let answer = state
        .qa
        .answer(&request.question, &request.user_id, request.document_id())
        .await;

    Json(QuestionResponse {
        success: true,
        answer: answer.answer,
        sources: answer.sources,
        message: "Question answered successfully.".to_string(),
    })
}

/// `GET /api/documents/{user_id}` — placeholder, not yet implemented.
async fn user_documents(Path(_user_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "documents": [],
        "message": "This endpoint is not yet fully implemented"
    }))
}
