//! Text extraction from uploaded document files.

use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// File extensions the service accepts for upload.
const RECOGNIZED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Whether a filename carries an extension the extractor can handle.
///
/// The upload guard calls this before any extraction attempt.
pub fn recognized_extension(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename).extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Reads a document file and produces its raw text.
///
/// Extraction is synchronous; async callers run it under
/// `tokio::task::spawn_blocking`.
pub trait TextExtractor: Send + Sync {
    /// Extract the raw text of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Extraction`] if the file is unreadable or cannot
    /// be parsed. An empty document is not an error; it yields an empty
    /// string and the pipeline produces zero chunks.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Extension-dispatching extractor for the recognized document types.
///
/// PDF pages are separated by form feeds in the extracted text; pages with
/// no text contribute nothing, and the remaining pages are joined with
/// blank lines. Plain text and markdown files are read as UTF-8.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)
            .map_err(|e| RagError::Extraction(format!("failed to read {}: {e}", path.display())))?;

        let raw = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| RagError::Extraction(format!("PDF extraction failed: {e}")))?;

        // Form feed is the page separator in extracted PDF text.
        let text = raw
            .split('\x0C')
            .map(str::trim)
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(path = %path.display(), chars = text.len(), "extracted PDF text");
        Ok(text)
    }

    fn extract_plain(&self, path: &Path) -> Result<String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RagError::Extraction(format!("failed to read {}: {e}", path.display())))?;
        debug!(path = %path.display(), chars = text.len(), "read plain text");
        Ok(text)
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let filename = path.file_name().map(|n| n.to_string_lossy().to_string());
        let ext = filename.as_deref().and_then(extension_of);

        match ext.as_deref() {
            Some("pdf") => self.extract_pdf(path),
            Some("txt") | Some("md") => self.extract_plain(path),
            other => Err(RagError::Extraction(format!(
                "unsupported document extension: {:?}",
                other.unwrap_or("none")
            ))),
        }
    }
}
