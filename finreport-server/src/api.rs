//! Request and response shapes for the HTTP surface.

use finreport_rag::SourceRef;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/question` and `POST /api/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    /// The natural-language question.
    pub question: String,
    /// The asking user's ID.
    pub user_id: String,
    /// Optional restriction to a single document.
    #[serde(default)]
    pub document_id: Option<String>,
    /// Synonym for `document_id` accepted for frontend compatibility.
    #[serde(default)]
    pub file_id: Option<String>,
}

impl QuestionRequest {
    /// The effective document filter: `document_id` wins over `file_id`.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref().or(self.file_id.as_deref())
    }
}

/// Response of the question endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    /// Whether the question was handled.
    pub success: bool,
    /// The generated (or fallback) answer text.
    pub answer: String,
    /// Source documents backing the answer.
    pub sources: Vec<SourceRef>,
    /// Human-readable status message.
    pub message: String,
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Whether the upload was processed.
    pub success: bool,
    /// The ID under which the document was stored, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Human-readable status message.
    pub message: String,
}
