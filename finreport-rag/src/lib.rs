//! Retrieval-Augmented Generation core for the financial report analyzer.
//!
//! The document pipeline is a linear composition of small pieces:
//!
//! ```text
//! file ──► extract ──► normalize ──► chunk ──► embed ──► VectorIndex
//!
//! question ──► embed ──► filtered query ──► relevance cutoff ──► ChatModel ──► Answer
//! ```
//!
//! Collaborators sit behind traits ([`TextExtractor`], [`EmbeddingProvider`],
//! [`VectorIndex`], [`ChatModel`]) so the pipeline and Q&A engine stay
//! independently testable with substitutable fakes. Hosted backends are
//! provided for OpenAI (embeddings + chat) and Pinecone, plus an in-memory
//! index for development and tests.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod memory;
pub mod openai;
pub mod pinecone;
pub mod qa;
pub mod tokenizer;

pub use chunking::{RecursiveTokenChunker, normalize_whitespace};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{
    Answer, ChunkMetadata, DocumentMeta, RetrievedChunk, ScoredMatch, SourceRef, VectorRecord,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{DocumentExtractor, TextExtractor, recognized_extension};
pub use index::{QueryFilter, VectorIndex};
pub use ingest::{IngestReport, IngestionPipeline};
pub use llm::ChatModel;
pub use memory::MemoryIndex;
pub use openai::{OpenAiChat, OpenAiEmbeddings};
pub use pinecone::PineconeIndex;
pub use qa::{GENERATION_FAILURE_ANSWER, NO_CONTEXT_ANSWER, QaEngine};
pub use tokenizer::TokenCounter;
