//! Page text extraction.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
};

use {async_trait::async_trait, tracing::debug};

use crate::error::DocumentError;

/// Text of one page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    pub number: u32,
    pub text: String,
}

/// Reads a document from disk into page texts.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Vec<DocumentPage>, DocumentError>;
}

/// Loads PDFs page by page and plain-text files as a single page.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, path: &Path) -> Result<Vec<DocumentPage>, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let pages = match ext.as_str() {
            "pdf" => {
                let owned = path.to_path_buf();
                tokio::task::spawn_blocking(move || extract_pdf_pages(&owned))
                    .await
                    .map_err(|e| DocumentError::load(path, format!("extraction task failed: {e}")))??
            },
            "txt" | "text" | "md" | "markdown" => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| DocumentError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                vec![text]
            },
            _ => {
                return Err(DocumentError::Unsupported {
                    path: path.to_path_buf(),
                });
            },
        };

        let pages = number_pages(pages);
        debug!(path = %path.display(), pages = pages.len(), "loaded document");
        Ok(pages)
    }
}

/// Number pages from 1 and drop pages with no extractable text, keeping the
/// original page numbers of the rest.
fn number_pages(pages: Vec<String>) -> Vec<DocumentPage> {
    pages
        .into_iter()
        .zip(1u32..)
        .filter(|(text, _)| !text.trim().is_empty())
        .map(|(text, number)| DocumentPage { number, text })
        .collect()
}

fn extract_pdf_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    if !path.is_file() {
        return Err(DocumentError::load(path, "file not found"));
    }
    // pdf-extract panics on some malformed font tables
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path))) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(DocumentError::load(path, e.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(DocumentError::load(path, format!("PDF parser panicked: {message}")))
        },
    }
}
