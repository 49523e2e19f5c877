//! Whitespace normalization and recursive token-bounded chunking.
//!
//! Text is split hierarchically at paragraph, line, word, and finally
//! character boundaries, measuring lengths in model tokens rather than
//! characters. Adjacent splits are merged greedily up to the token budget,
//! and a trailing window of roughly `chunk_overlap` tokens is carried into
//! the next chunk.

use std::collections::VecDeque;

use crate::error::{RagError, Result};
use crate::tokenizer::TokenCounter;

/// Separator hierarchy: paragraph, line, word, character.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Collapse every whitespace run (including newlines) into a single space.
///
/// This deliberately destroys paragraph structure in favor of token-dense
/// chunks; the chunker's finer separators do the rest of the work.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A splitter that produces overlapping, token-bounded text segments.
///
/// No produced segment exceeds `chunk_size` tokens except when a single
/// indivisible piece is itself over budget (impossible once the character
/// fallback applies). Consecutive segments share a suffix/prefix of
/// approximately `chunk_overlap` tokens when the input is long enough to
/// need splitting.
#[derive(Debug, Clone)]
pub struct RecursiveTokenChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    counter: TokenCounter,
}

/// A split piece with its cached token count.
struct Piece {
    text: String,
    tokens: usize,
}

impl RecursiveTokenChunker {
    /// Create a new chunker with the given token budget and overlap.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize, counter: TokenCounter) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap, counter })
    }

    /// The token budget per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The overlap carried between consecutive chunks, in tokens.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into overlapping token-bounded segments.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only input.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_level(text, &SEPARATORS)
    }

    fn split_level(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);

        let mut chunks: Vec<String> = Vec::new();
        // Sliding window of pieces forming the chunk under construction.
        // `fresh` counts pieces not yet emitted in any chunk, so a window
        // holding only carried overlap is never emitted on its own.
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut window_tokens = 0usize;
        let mut fresh = 0usize;

        for piece_text in split_keeping_separator(text, separator) {
            let tokens = self.counter.count(piece_text);

            if tokens > self.chunk_size {
                // Oversized even alone: flush what we have, then descend to
                // the next separator level. Overlap does not carry across a
                // recursed boundary.
                if fresh > 0 {
                    push_chunk(&mut chunks, &window);
                }
                window.clear();
                window_tokens = 0;
                fresh = 0;

                if finer.is_empty() {
                    chunks.push(piece_text.to_string());
                } else {
                    chunks.extend(self.split_level(piece_text, finer));
                }
                continue;
            }

            // Make room for the incoming piece.
            while !window.is_empty() && window_tokens + tokens > self.chunk_size {
                if fresh > 0 {
                    push_chunk(&mut chunks, &window);
                    fresh = 0;
                    // Retain a trailing overlap window for the next chunk.
                    while window_tokens > self.chunk_overlap {
                        if let Some(dropped) = window.pop_front() {
                            window_tokens -= dropped.tokens;
                        } else {
                            break;
                        }
                    }
                } else if let Some(dropped) = window.pop_front() {
                    window_tokens -= dropped.tokens;
                }
            }

            window_tokens += tokens;
            window.push_back(Piece { text: piece_text.to_string(), tokens });
            fresh += 1;
        }

        if fresh > 0 {
            push_chunk(&mut chunks, &window);
        }

        chunks
    }
}

/// Join the window into a chunk, trimming edge whitespace left over from
/// separator-attached pieces. Whitespace-only windows produce nothing.
fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<Piece>) {
    let joined: String = window.iter().map(|p| p.text.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Choose the first separator that occurs in `text`, falling back to the
/// character level. Returns the chosen separator and the finer ones after it.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split text at a separator while keeping the separator attached to the
/// preceding piece, so joining pieces reconstructs the original text.
/// An empty separator splits into individual characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}
