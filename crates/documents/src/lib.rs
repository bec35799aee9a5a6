//! Document processing: load page text, split it into passages, and
//! memoize the result per file path.

pub mod cache;
pub mod error;
pub mod loader;
pub mod splitter;

pub use {
    cache::{ProcessedDocument, ProcessingCache},
    error::DocumentError,
    loader::{DocumentLoader, DocumentPage, FileLoader},
    splitter::{Passage, RecursiveCharacterSplitter, TextSplitter},
};
