//! In-memory document store using `DashMap`.
//!
//! Data is lost on process restart; use [`super::JsonlDocumentStore`] when
//! coherence records must survive between runs.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{Document, DocumentId, DocumentStore};
use crate::{Error, Result};

/// In-memory document store keyed by collection name.
///
/// Thread-safe; ids are unique across all collections of one store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Vec<Document>>,
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |docs| docs.len())
    }

    /// Whether a collection has no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.value().clone())
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, body: serde_json::Value) -> Result<DocumentId> {
        let id = DocumentId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, body));
        Ok(id)
    }

    async fn update_by_id(&self, collection: &str, document: &Document) -> Result<()> {
        let not_found = || Error::DocumentNotFound {
            collection: collection.to_string(),
            id: document.id().get(),
        };
        let mut docs = self.collections.get_mut(collection).ok_or_else(not_found)?;
        let slot = docs
            .iter_mut()
            .find(|doc| doc.id() == document.id())
            .ok_or_else(not_found)?;
        *slot = document.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_len() {
        let store = MemoryDocumentStore::new();
        assert!(store.is_empty("raw"));
        store.insert_one("raw", serde_json::json!({})).await.unwrap();
        store.insert_one("raw", serde_json::json!({})).await.unwrap();
        assert_eq!(store.len("raw"), 2);
        assert_eq!(store.len("other"), 0);
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_inserts() {
        use std::sync::Arc;

        let store = Arc::new(MemoryDocumentStore::new());
        let mut handles = vec![];

        for i in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert_one("coherence", serde_json::json!({ "i": i }))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 100);
        assert_eq!(store.len("coherence"), 100);
    }
}
