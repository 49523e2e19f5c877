//! Data types for documents, chunks, vector records, and answers.

use serde::{Deserialize, Serialize};

/// Attributes describing a source document, attached at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    /// The ID of the user who owns the document.
    pub user_id: String,
    /// The original filename of the upload.
    pub filename: String,
    /// Where the document came from (e.g. `"upload"`).
    pub source: String,
    /// The document category (e.g. `"financial_report"`).
    pub document_type: String,
}

impl DocumentMeta {
    /// Metadata for a user-uploaded financial report.
    pub fn upload(user_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            filename: filename.into(),
            source: "upload".to_string(),
            document_type: "financial_report".to_string(),
        }
    }
}

/// The flattened document + chunk attribute set stored alongside each vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// The ID of the user who owns the parent document.
    pub user_id: String,
    /// The original filename of the parent document.
    pub filename: String,
    /// Where the parent document came from.
    pub source: String,
    /// The parent document category.
    pub document_type: String,
    /// The ID of the parent document.
    pub document_id: String,
    /// 0-based position of this chunk within the document.
    pub chunk_index: usize,
    /// The chunk text itself.
    pub text: String,
    /// Total number of chunks the document produced at ingestion time.
    pub total_chunks: usize,
}

/// A vector and its metadata, the unit stored in the index.
///
/// The record ID is `{document_id}_chunk_{chunk_index}` and must be unique
/// within the index; re-upserting the same ID overwrites the prior record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    /// Unique record ID within the index.
    pub id: String,
    /// The embedding vector. Its length must match the index dimensionality.
    pub values: Vec<f32>,
    /// Flattened document + chunk attributes.
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    /// Build the deterministic record ID for a chunk of a document.
    pub fn chunk_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }
}

/// A raw query hit from the vector index, before relevance filtering.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    /// The record ID of the hit.
    pub id: String,
    /// Cosine similarity score in [-1, 1].
    pub score: f32,
    /// The stored metadata for the hit.
    pub metadata: ChunkMetadata,
}

/// A retrieved chunk that passed the relevance cutoff, used as grounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk text.
    pub text: String,
    /// Cosine similarity score in [-1, 1], at least the relevance cutoff.
    pub score: f32,
    /// The parent document ID.
    pub document_id: String,
    /// The parent document filename.
    pub filename: String,
    /// 0-based position of the chunk within its document.
    pub chunk_index: usize,
}

/// A reference to a source document backing an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// The source document filename.
    pub filename: String,
    /// The source document ID.
    pub document_id: String,
}

/// A generated answer with its deduplicated source list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text, returned verbatim from the model (or fallback content).
    pub answer: String,
    /// Source documents, deduplicated by filename in first-seen order.
    pub sources: Vec<SourceRef>,
}
