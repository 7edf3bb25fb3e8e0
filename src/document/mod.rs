//! Document store interface consumed by the pipeline phases
//!
//! Collections are named bags of JSON documents. Each phase reads and appends
//! to its own collection; there are no transactions and no schema beyond
//! what callers impose. Re-running a phase is safe because every writer
//! checks existence/membership first (at-least-once semantics).
//!
//! # Example
//!
//! ```rust
//! use topic_grid::document::{DocumentStore, MemoryDocumentStore};
//!
//! # async fn example() -> topic_grid::Result<()> {
//! let store = MemoryDocumentStore::new();
//!
//! let id = store.insert_one("coherence", serde_json::json!({"k": 3})).await?;
//! let docs = store.read_all("coherence").await?;
//! assert_eq!(docs[0].id(), id);
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;
mod publication;

pub use file::JsonlDocumentStore;
pub use memory::MemoryDocumentStore;
pub use publication::{
    read_document_topics, reference_texts, store_document_topics, store_tokens, DocumentTopics,
    InferenceReport, Publication, TokenState,
};

use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Store-assigned document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document: identity plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    body: serde_json::Value,
}

impl Document {
    /// Pair an id with a body.
    #[must_use]
    pub const fn new(id: DocumentId, body: serde_json::Value) -> Self {
        Self { id, body }
    }

    /// Document id.
    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// JSON body.
    #[must_use]
    pub const fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Decode the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.body)?)
    }

    /// Replace the body with a typed value, keeping the id.
    ///
    /// # Errors
    ///
    /// Returns `Json` if `value` cannot be serialized.
    pub fn with_body<T: Serialize>(&self, value: &T) -> Result<Self> {
        Ok(Self {
            id: self.id,
            body: serde_json::to_value(value)?,
        })
    }
}

/// Collection-keyed document store.
///
/// Designed to mirror the consumed interface of an external document
/// database (`read_all`, `insert_one`, `update_by_id`) so that a network
/// backend can replace the bundled ones.
pub trait DocumentStore: Send + Sync {
    /// Read every document of a collection in insertion order.
    ///
    /// An unknown collection is empty, not an error.
    fn read_all(&self, collection: &str) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// Append a document and return its new id.
    fn insert_one(
        &self,
        collection: &str,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<DocumentId>> + Send;

    /// Replace the body of an existing document.
    ///
    /// Returns `DocumentNotFound` if the id is not in the collection.
    fn update_by_id(
        &self,
        collection: &str,
        document: &Document,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Serialize `value` and append it.
    fn insert_typed<T: Serialize + Sync>(
        &self,
        collection: &str,
        value: &T,
    ) -> impl Future<Output = Result<DocumentId>> + Send {
        async move {
            let body = serde_json::to_value(value)?;
            self.insert_one(collection, body).await
        }
    }
}
