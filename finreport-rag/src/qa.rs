//! Retrieval and grounded answer generation.
//!
//! Both halves fail soft: retrieval failures yield an empty chunk list and
//! generation failures yield a fixed apology, with the underlying error
//! logged. Callers always get an [`Answer`].

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::document::{Answer, RetrievedChunk, SourceRef};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::{QueryFilter, VectorIndex};
use crate::llm::ChatModel;

/// Answer returned when no relevant chunks are found. No model call is made.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information to answer your \
     question. Please try asking about something that's in your uploaded financial reports.";

/// Answer returned when the model invocation fails.
pub const GENERATION_FAILURE_ANSWER: &str =
    "I encountered an error while trying to answer your question. Please try again later.";

/// Retrieves grounding context and generates answers for user questions.
pub struct QaEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    config: PipelineConfig,
}

impl QaEngine {
    /// Create a new engine from its collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        config: PipelineConfig,
    ) -> Self {
        Self { embedder, index, chat, config }
    }

    /// Retrieve up to `top_k` relevant chunks for a question.
    ///
    /// The question is embedded with the same model used at ingestion, the
    /// index is queried with a user (and optional document) filter, and
    /// results below the relevance cutoff are dropped. Index ordering is
    /// preserved; no secondary tie-break is applied.
    ///
    /// Fails soft: any retrieval failure is logged and yields an empty
    /// list, indistinguishable from "no relevant chunks" to the caller.
    pub async fn retrieve(
        &self,
        question: &str,
        user_id: &str,
        document_id: Option<&str>,
    ) -> Vec<RetrievedChunk> {
        match self.try_retrieve(question, user_id, document_id).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(user_id, error = %e, "retrieval failed, returning no chunks");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        question: &str,
        user_id: &str,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>> {
        let embedding = self.embedder.embed(question).await?;

        let mut filter = QueryFilter::for_user(user_id);
        if let Some(document_id) = document_id {
            filter = filter.with_document(document_id);
        }

        let matches = self.index.query(&embedding, self.config.top_k, &filter).await?;

        let chunks: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter(|hit| hit.score >= self.config.score_threshold)
            .map(|hit| RetrievedChunk {
                text: hit.metadata.text,
                score: hit.score,
                document_id: hit.metadata.document_id,
                filename: hit.metadata.filename,
                chunk_index: hit.metadata.chunk_index,
            })
            .collect();

        info!(user_id, count = chunks.len(), "retrieved relevant chunks");
        Ok(chunks)
    }

    /// Generate a grounded answer from retrieved chunks.
    ///
    /// With no chunks, returns the fixed insufficient-information answer
    /// without invoking the model. Otherwise the chunk texts (in the order
    /// provided) become the grounding context for a single model call at
    /// temperature 0; the model output is returned verbatim, with sources
    /// deduplicated by filename in first-seen order. A model failure is
    /// logged and yields the fixed apology answer.
    pub async fn generate(&self, question: &str, chunks: &[RetrievedChunk]) -> Answer {
        if chunks.is_empty() {
            return Answer { answer: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new() };
        }

        let context =
            chunks.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let prompt = build_prompt(question, &context);

        match self.chat.complete(&prompt).await {
            Ok(answer) => Answer { answer, sources: dedup_sources(chunks) },
            Err(e) => {
                error!(error = %e, "answer generation failed, returning fallback");
                Answer { answer: GENERATION_FAILURE_ANSWER.to_string(), sources: Vec::new() }
            }
        }
    }

    /// Answer a question end to end: retrieve, then generate.
    ///
    /// Never returns an error; both halves fall back to fixed content.
    pub async fn answer(
        &self,
        question: &str,
        user_id: &str,
        document_id: Option<&str>,
    ) -> Answer {
        let chunks = self.retrieve(question, user_id, document_id).await;
        self.generate(question, &chunks).await
    }
}

/// The grounding prompt: answer only from context, decline rather than
/// fabricate.
fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a financial analyst assistant. Use the following context information \
         from financial reports to answer the question.\n\
         If you don't know the answer based on the context, say \"I don't have enough \
         information to answer this question.\"\n\
         Don't make up information that's not in the context.\n\n\
         CONTEXT:\n{context}\n\n\
         QUESTION:\n{question}\n\n\
         ANSWER:"
    )
}

/// Deduplicate sources by filename, preserving first-seen order across the
/// already score-ranked chunk list.
fn dedup_sources(chunks: &[RetrievedChunk]) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    for chunk in chunks {
        if !sources.iter().any(|source| source.filename == chunk.filename) {
            sources.push(SourceRef {
                filename: chunk.filename.clone(),
                document_id: chunk.document_id.clone(),
            });
        }
    }
    sources
}
