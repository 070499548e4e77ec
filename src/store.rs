//! Remote document store boundary.
//!
//! The concrete store SDK lives outside this crate; the sync layer is written
//! entirely against these primitives. Documents are JSON bodies addressed by
//! [`DocPath`]; queries are cursor-paged over a single collection.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::paths::DocPath;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    /// Transient backend trouble (timeouts, unavailable service). Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// A document as read back from the store: its id plus its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Cursor-paged query over one collection, ordered by a single field.
#[derive(Debug, Clone)]
pub struct Query {
    pub order_by: &'static str,
    pub descending: bool,
    pub limit: usize,
    /// Opaque continuation token from a previous [`QueryPage`]. The store
    /// resumes strictly after the position it encodes.
    pub start_after: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryPage {
    pub docs: Vec<Document>,
    /// Token for the next page; `None` when the page came back empty.
    pub cursor: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document. `Ok(None)` when absent; `NotFound` is reserved
    /// for paths whose *parent* hierarchy is invalid on the backend.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite the document at `path`.
    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document. Fails with `NotFound` when
    /// the document does not exist.
    async fn update(&self, path: &DocPath, fields: Value) -> Result<(), StoreError>;

    /// Delete the document at `path`. Deleting an absent document succeeds.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Add a document to `collection` with a store-assigned id; returns the id.
    async fn add(&self, collection: &DocPath, data: Value) -> Result<String, StoreError>;

    /// Run a cursor-paged query over `collection`.
    async fn query(&self, collection: &DocPath, query: Query) -> Result<QueryPage, StoreError>;

    /// List every document in `collection`, unordered. Used for small nested
    /// collections (a goal's todos) that are always loaded whole.
    async fn list_all(&self, collection: &DocPath) -> Result<Vec<Document>, StoreError>;
}

/// Blob-store boundary: resolves a blob path to a retrievable download URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download_url(&self, path: &str) -> Result<String, StoreError>;
}
