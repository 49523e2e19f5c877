//! Chat model trait for grounded answer generation.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted language model invoked once per question with a single prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete `prompt` and return the model's raw text output verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
