//! Token counting for chunk sizing.
//!
//! Chunk budgets are measured in model tokens, not characters or words, so
//! the chunker needs the same tokenizer family the embedding model uses.

use std::sync::Arc;

use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::error::{RagError, Result};

/// Counts tokens with a `cl100k_base` BPE, the encoding used by the
/// OpenAI embedding and chat models this crate targets.
///
/// Construction is expensive (the BPE tables are built once); clone the
/// counter freely afterwards, it shares the underlying encoder.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TokenCounter {
    /// Build a `cl100k_base` token counter.
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base()
            .map_err(|e| RagError::Config(format!("failed to load cl100k_base encoding: {e}")))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter").finish_non_exhaustive()
    }
}
