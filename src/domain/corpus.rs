// ============================================================
// Layer 3 — Corpus Store
// ============================================================
// The ordered collection of documents the learner works on.
//
// Every document sits behind its own Arc<Mutex<..>> so that an
// annotation worker can hold the documents of its batch while
// the controller keeps reading the rest of the corpus. The
// controller never touches a document it has handed to a
// worker until the worker has been joined, so these mutexes
// are never contended in practice.
//
// Reference: Rust Book §16 (Shared-State Concurrency)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<SharedDocument>,
}

impl Corpus {
    /// Load every document from `source`
    pub fn open(source: &dyn DocumentSource) -> Result<Self> {
        Ok(Self::from_documents(source.load_all()?))
    }

    pub fn from_documents(docs: Vec<Document>) -> Self {
        Self {
            docs: docs.into_iter().map(|d| Arc::new(Mutex::new(d))).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    /// Shared handle to document `index`
    pub fn get(&self, index: usize) -> Option<SharedDocument> {
        self.docs.get(index).cloned()
    }

    /// Lock document `index` for reading or writing.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn lock(&self, index: usize) -> MutexGuard<'_, Document> {
        lock_document(&self.docs[index])
    }
}

/// Lock a shared document, recovering the data if a worker
/// panicked while holding it.
pub fn lock_document(doc: &SharedDocument) -> MutexGuard<'_, Document> {
    doc.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_get() {
        let corpus = Corpus::from_documents(vec![
            Document::new("a", "one"),
            Document::new("b", "two"),
        ]);
        assert_eq!(corpus.size(), 2);
        assert_eq!(corpus.lock(1).text(), "two");
        assert!(corpus.get(2).is_none());
    }

    #[test]
    fn test_poisoned_document_is_recovered() {
        let corpus = Corpus::from_documents(vec![Document::new("a", "one")]);
        let shared = corpus.get(0).unwrap();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("worker failed");
        })
        .join();
        assert_eq!(corpus.lock(0).text(), "one");
    }
}
