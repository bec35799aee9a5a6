//! Recursive character text splitting.
//!
//! Text is cut on the first separator (paragraph, line, word, character)
//! that occurs in it. Pieces shorter than the chunk size are merged back
//! greedily; longer pieces are split again with the remaining separators.
//! Lengths are counted in characters.

use std::collections::VecDeque;

use {docchat_config::ChunkingConfig, serde::Serialize, tracing::debug};

use crate::loader::DocumentPage;

/// Default separators, coarsest first. The empty separator splits between
/// characters and always applies.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A bounded slice of document text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub text: String,
    /// 1-based page the passage was cut from.
    pub page: u32,
    /// Position in the document's passage sequence.
    pub index: usize,
}

/// Splits text into passages. Implementations must be deterministic.
pub trait TextSplitter: Send + Sync {
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split each page separately so no passage spans a page break.
    fn split_pages(&self, pages: &[DocumentPage]) -> Vec<Passage> {
        let mut passages = Vec::new();
        for page in pages {
            for text in self.split_text(&page.text) {
                passages.push(Passage {
                    text,
                    page: page.number,
                    index: passages.len(),
                });
            }
        }
        passages
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut next_separators: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.as_str();
                next_separators = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut good_splits: Vec<&str> = Vec::new();
        for split in splits {
            if char_len(split) < self.chunk_size {
                good_splits.push(split);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if next_separators.is_empty() {
                final_chunks.push(split.to_string());
            } else {
                final_chunks.extend(self.split_recursive(split, next_separators));
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }
        final_chunks
    }

    /// Greedily join `splits` with `separator` into chunks of at most
    /// `chunk_size`, carrying up to `chunk_overlap` characters of trailing
    /// splits into the next chunk. Both limits count the separators between
    /// joined splits.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.chunk_size {
                if total > self.chunk_size {
                    debug!(
                        size = total,
                        chunk_size = self.chunk_size,
                        "created a passage longer than the chunk size"
                    );
                }
                if let Some(doc) = join_docs(&current, separator) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (total > 0 && total + len + sep_len > self.chunk_size)
                {
                    let joined = if current.len() > 1 { sep_len } else { 0 };
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + joined;
                }
            }
            let joiner = if current.is_empty() { 0 } else { sep_len };
            current.push_back(split);
            total += len + joiner;
        }
        if let Some(doc) = join_docs(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_docs(docs: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = docs.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
