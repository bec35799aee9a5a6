//! Per-path memoization of processed documents.
//!
//! A path being processed has a shared once-cell in the pending map. The
//! first caller runs load + split inside the cell; concurrent callers for
//! the same path await that same computation instead of repeating it. A
//! finished document moves to the LRU map; a failed computation leaves
//! nothing behind, so the next call retries.
//!
//! Entries are never invalidated when the file on disk changes. Only
//! finished documents count against `capacity`; past it the least recently
//! used one is dropped. In-flight computations are never evicted.

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use {
    docchat_retrieval::{EmbeddingError, EmbeddingProvider, VectorIndex},
    lru::LruCache,
    tokio::sync::OnceCell,
    tracing::{debug, info},
};

use crate::{
    error::DocumentError,
    loader::DocumentLoader,
    splitter::{Passage, TextSplitter},
};

/// Passages of one document plus the embedding index built over them.
#[derive(Debug)]
pub struct ProcessedDocument {
    passages: Vec<Passage>,
    index: OnceCell<VectorIndex>,
}

impl ProcessedDocument {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            index: OnceCell::new(),
        }
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// The vector index over this document's passages, built on first use
    /// and reused afterwards. A failed build is retried on the next call.
    pub async fn index(
        &self,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<&VectorIndex, EmbeddingError> {
        self.index
            .get_or_try_init(|| async {
                let texts: Vec<String> = self.passages.iter().map(|p| p.text.clone()).collect();
                VectorIndex::build(embedder, &texts).await
            })
            .await
    }
}

type Slot = Arc<OnceCell<Arc<ProcessedDocument>>>;

struct Entries {
    done: LruCache<String, Arc<ProcessedDocument>>,
    pending: HashMap<String, Slot>,
}

pub struct ProcessingCache {
    loader: Arc<dyn DocumentLoader>,
    splitter: Arc<dyn TextSplitter>,
    entries: Mutex<Entries>,
}

impl ProcessingCache {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        splitter: Arc<dyn TextSplitter>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            splitter,
            entries: Mutex::new(Entries {
                done: LruCache::new(capacity),
                pending: HashMap::new(),
            }),
        }
    }

    /// Return the passages for `path`, loading and splitting the document
    /// only if this path has not been processed yet.
    pub async fn get_or_process(&self, path: &str) -> Result<Arc<ProcessedDocument>, DocumentError> {
        let slot = {
            let mut entries = self.lock();
            if let Some(doc) = entries.done.get(path) {
                debug!(path, "using cached passages");
                return Ok(Arc::clone(doc));
            }
            Arc::clone(
                entries
                    .pending
                    .entry(path.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = slot
            .get_or_try_init(|| self.process(path))
            .await
            .cloned();
        self.settle(path, &slot, &result);
        result
    }

    /// True once `path` has been processed successfully and is still cached.
    pub fn contains(&self, path: &str) -> bool {
        self.lock().done.contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().done.is_empty()
    }

    pub fn clear(&self) {
        self.lock().done.clear();
    }

    async fn process(&self, path: &str) -> Result<Arc<ProcessedDocument>, DocumentError> {
        let pages = self.loader.load(Path::new(path)).await?;
        let passages = self.splitter.split_pages(&pages);
        info!(
            path,
            pages = pages.len(),
            passages = passages.len(),
            "processed document"
        );
        Ok(Arc::new(ProcessedDocument::new(passages)))
    }

    /// Move a finished computation out of the pending map. A successful
    /// result is cached even if an earlier waiter on the same slot failed.
    /// A failed slot is dropped once no other caller is still waiting on it.
    fn settle(
        &self,
        path: &str,
        slot: &Slot,
        result: &Result<Arc<ProcessedDocument>, DocumentError>,
    ) {
        let mut entries = self.lock();
        let ours = entries
            .pending
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current, slot));

        match result {
            Ok(doc) => {
                if ours {
                    entries.pending.remove(path);
                }
                if !entries.done.contains(path)
                    && let Some((evicted, _)) = entries.done.push(path.to_string(), Arc::clone(doc))
                    && evicted != path
                {
                    debug!(path = %evicted, "evicted least recently used document");
                }
            },
            // the map and this caller hold the only references
            Err(_) if ours && Arc::strong_count(slot) <= 2 && !slot.initialized() => {
                entries.pending.remove(path);
            },
            Err(_) => {},
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
