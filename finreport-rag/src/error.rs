//! Error types for the `finreport-rag` crate.

use thiserror::Error;

/// Errors that can occur in the document pipeline and Q&A engine.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source file was unreadable or could not be parsed into text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The language model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend (upsert or query).
    #[error("Vector index error ({backend}): {message}")]
    Index {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration error: dimensionality mismatch, invalid tunables,
    /// or missing credentials. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
