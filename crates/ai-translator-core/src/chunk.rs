//! Token-bounded text chunking.
//!
//! Long texts are split on the most natural boundary that keeps every
//! chunk within the token limit: paragraphs, then lines, then sentences,
//! then words, and finally a plain character cut sized from the text's
//! observed characters-per-token ratio. Separators stay attached to the
//! piece before them, so concatenating the chunks reproduces the input.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::error::{Error, Result};
use crate::util::truncate_chars;

/// Counts tokens the way the target model's tokenizer would.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// `cl100k_base` BPE token counter
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::ConfigInvalid {
            field: "tokenizer".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Boundaries tried in order before falling back to a character cut
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", "。", " "];

#[derive(Clone)]
pub struct Chunker {
    counter: Arc<dyn TokenCounter>,
}

impl Chunker {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Chunker backed by the `cl100k_base` tokenizer.
    pub fn cl100k() -> Result<Self> {
        Ok(Self::new(Arc::new(TiktokenCounter::cl100k()?)))
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Split `text` into chunks of at most `token_limit` tokens.
    ///
    /// Text already within the limit comes back as a single chunk. A single
    /// character wider than the limit still forms its own chunk.
    pub fn split(&self, text: &str, token_limit: usize) -> Vec<String> {
        let limit = token_limit.max(1);
        let tokens = self.counter.count(text);
        if tokens <= limit {
            return vec![text.to_string()];
        }

        let chars = text.chars().count();
        let chars_per_token = (chars / tokens.max(1)).max(1);
        let char_budget = limit.saturating_mul(chars_per_token);

        let chunks = self.split_recursive(text, limit, char_budget, &SEPARATORS);
        tracing::debug!(
            "Split {} tokens into {} chunks (limit {}, ~{} chars/token)",
            tokens,
            chunks.len(),
            limit,
            chars_per_token
        );
        chunks
    }

    fn split_recursive(
        &self,
        text: &str,
        limit: usize,
        char_budget: usize,
        separators: &[&str],
    ) -> Vec<String> {
        if self.counter.count(text) <= limit {
            return vec![text.to_string()];
        }

        let Some((separator, finer)) = separators.split_first() else {
            return self.cut_by_chars(text, limit, char_budget);
        };

        let parts: Vec<&str> = text.split_inclusive(separator).collect();
        if parts.len() <= 1 {
            return self.split_recursive(text, limit, char_budget, finer);
        }

        let pieces = parts
            .into_iter()
            .flat_map(|part| self.split_recursive(part, limit, char_budget, finer))
            .collect();
        self.merge(pieces, limit)
    }

    /// Greedily pack adjacent pieces while the result stays within the limit.
    fn merge(&self, pieces: Vec<String>, limit: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if current.is_empty() {
                current = piece;
                continue;
            }
            let candidate = format!("{current}{piece}");
            if self.counter.count(&candidate) <= limit {
                current = candidate;
            } else {
                chunks.push(std::mem::replace(&mut current, piece));
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn cut_by_chars(&self, text: &str, limit: usize, char_budget: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let mut take = char_budget.max(1);
            while take > 1 && self.counter.count(truncate_chars(rest, take)) > limit {
                take -= (take / 10).max(1);
            }
            let piece = truncate_chars(rest, take);
            chunks.push(piece.to_string());
            rest = &rest[piece.len()..];
        }
        chunks
    }
}
