use std::sync::Arc;

use finreport_server::server::{AppState, ServerConfig, run_server};
use finreport_rag::{
    DocumentExtractor, EmbeddingProvider, IngestionPipeline, OpenAiChat, OpenAiEmbeddings,
    PineconeIndex, PipelineConfig, QaEngine, RecursiveTokenChunker, TokenCounter, VectorIndex,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = PipelineConfig::default();

    // Client handles are constructed once and shared for the process
    // lifetime; nothing mutates them after this point.
    let embedder = Arc::new(OpenAiEmbeddings::from_env()?);
    let chat = Arc::new(OpenAiChat::from_env()?);
    let index = Arc::new(PineconeIndex::from_env()?);

    // Fatal on dimensionality mismatch; the index must be recreated
    // externally in that case.
    index.ensure_ready(embedder.dimensions()).await?;

    let counter = TokenCounter::new()?;
    let chunker = RecursiveTokenChunker::new(config.chunk_size, config.chunk_overlap, counter)?;

    let pipeline = IngestionPipeline::new(
        Arc::new(DocumentExtractor::new()),
        chunker,
        embedder.clone(),
        index.clone(),
    );
    let qa = QaEngine::new(embedder, index, chat, config);

    let state = AppState { pipeline: Arc::new(pipeline), qa: Arc::new(qa) };
    run_server(ServerConfig::from_env(), state).await
}
