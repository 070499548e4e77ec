//! In-memory doubles for the store boundaries, test-only.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use ulid::Ulid;

use crate::paths::DocPath;
use crate::store::{BlobStore, Document, DocumentStore, Query, QueryPage, StoreError};

/// Wire up log output for tests; run them with `RUST_LOG=debug` to see it.
/// Safe to call from every test, only the first call installs the subscriber.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Hierarchical document store over a flat path-keyed map. Cursor tokens are
/// opaque `sortKey\x1fid` pairs so resuming does not depend on the document
/// still existing.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
    query_count: AtomicUsize,
    unreachable: AtomicBool,
    query_gate: Mutex<Option<Arc<Notify>>>,
}

const CURSOR_SEP: char = '\u{1f}';

impl MemoryStore {
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    /// When set, every store call fails with `Unavailable`, simulating a
    /// device that cannot reach the backend.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make the next query block until the returned handle is notified.
    /// Used to hold a fetch in flight while a second caller races it.
    pub fn gate_queries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.query_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("backend unreachable".into()))
        } else {
            Ok(())
        }
    }

    /// Direct children of `collection`: one more path segment, no further nesting.
    fn children(&self, collection: &DocPath) -> Vec<Document> {
        let prefix = format!("{}/", collection.as_str());
        let docs = self.docs.lock().unwrap();
        docs.range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, value)| Document {
                id: key[prefix.len()..].to_string(),
                data: value.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.check_reachable()?;
        let docs = self.docs.lock().unwrap();
        Ok(docs.get(path.as_str()).map(|value| Document {
            id: path.doc_id().to_string(),
            data: value.clone(),
        }))
    }

    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError> {
        self.check_reachable()?;
        self.docs
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), data);
        Ok(())
    }

    async fn update(&self, path: &DocPath, fields: Value) -> Result<(), StoreError> {
        self.check_reachable()?;
        let mut docs = self.docs.lock().unwrap();
        let existing = docs
            .get_mut(path.as_str())
            .ok_or_else(|| StoreError::NotFound(path.as_str().to_string()))?;
        if let (Some(target), Some(patch)) = (existing.as_object_mut(), fields.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        } else {
            *existing = fields;
        }
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.check_reachable()?;
        self.docs.lock().unwrap().remove(path.as_str());
        Ok(())
    }

    async fn add(&self, collection: &DocPath, data: Value) -> Result<String, StoreError> {
        self.check_reachable()?;
        let id = Ulid::new().to_string();
        self.docs
            .lock()
            .unwrap()
            .insert(format!("{}/{}", collection.as_str(), id), data);
        Ok(id)
    }

    async fn query(&self, collection: &DocPath, query: Query) -> Result<QueryPage, StoreError> {
        let gate = self.query_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_reachable()?;
        self.query_count.fetch_add(1, Ordering::SeqCst);

        let mut rows: Vec<(String, Document)> = self
            .children(collection)
            .into_iter()
            .map(|doc| {
                let key = doc
                    .data
                    .get(query.order_by)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                (key, doc)
            })
            .collect();
        rows.sort_by(|a, b| {
            let ord = a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id));
            if query.descending { ord.reverse() } else { ord }
        });

        if let Some(token) = &query.start_after {
            let (after_key, after_id) = token
                .split_once(CURSOR_SEP)
                .ok_or_else(|| StoreError::Backend(format!("malformed cursor: {token}")))?;
            let position = rows
                .iter()
                .position(|(key, doc)| {
                    let ord = key
                        .as_str()
                        .cmp(after_key)
                        .then_with(|| doc.id.as_str().cmp(after_id));
                    if query.descending {
                        ord.is_lt()
                    } else {
                        ord.is_gt()
                    }
                })
                .unwrap_or(rows.len());
            rows.drain(..position);
        }

        rows.truncate(query.limit);
        let cursor = rows
            .last()
            .map(|(key, doc)| format!("{key}{CURSOR_SEP}{}", doc.id));
        Ok(QueryPage {
            docs: rows.into_iter().map(|(_, doc)| doc).collect(),
            cursor,
        })
    }

    async fn list_all(&self, collection: &DocPath) -> Result<Vec<Document>, StoreError> {
        self.check_reachable()?;
        Ok(self.children(collection))
    }
}

/// Blob store double: a path→URL map; unknown paths fail.
#[derive(Default)]
pub struct MemoryBlobStore {
    urls: Mutex<HashMap<String, String>>,
    hold: Mutex<Option<Arc<Notify>>>,
    served: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn put(&self, path: &str, url: &str) {
        self.urls
            .lock()
            .unwrap()
            .insert(path.to_string(), url.to_string());
    }

    /// Make every download wait at a gate until `notify_waiters` is called.
    /// Used to hold resolutions in flight while the aggregate gets dropped.
    pub fn hold_downloads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Downloads that made it past the gate.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.served.fetch_add(1, Ordering::SeqCst);
        let urls = self.urls.lock().unwrap();
        urls.get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths;
    use serde_json::json;

    #[tokio::test]
    async fn query_pages_resume_after_cursor() {
        let store = MemoryStore::default();
        let collection = paths::goals("u1");
        for i in 0..7 {
            store
                .add(&collection, json!({ "startDate": format!("2026-01-{:02}", i + 1) }))
                .await
                .unwrap();
        }

        let first = store
            .query(
                &collection,
                Query {
                    order_by: "startDate",
                    descending: true,
                    limit: 3,
                    start_after: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(first.docs.len(), 3);
        assert_eq!(first.docs[0].data["startDate"], "2026-01-07");

        let second = store
            .query(
                &collection,
                Query {
                    order_by: "startDate",
                    descending: true,
                    limit: 10,
                    start_after: first.cursor.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(second.docs.len(), 4);
        assert_eq!(second.docs[0].data["startDate"], "2026-01-04");
    }

    #[tokio::test]
    async fn children_are_direct_only() {
        let store = MemoryStore::default();
        store
            .set(&paths::goal("u1", "g1"), json!({ "title": "g" }))
            .await
            .unwrap();
        store
            .set(&paths::todo("u1", "g1", "t1"), json!({ "title": "t" }))
            .await
            .unwrap();

        let goals = store.list_all(&paths::goals("u1")).await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, "g1");
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::default();
        let path = paths::goal("u1", "g1");
        store
            .set(&path, json!({ "title": "a", "status": "unachieved" }))
            .await
            .unwrap();
        store.update(&path, json!({ "title": "b" })).await.unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.data["title"], "b");
        assert_eq!(doc.data["status"], "unachieved");
    }

    #[tokio::test]
    async fn update_of_missing_document_fails() {
        let store = MemoryStore::default();
        let err = store
            .update(&paths::goal("u1", "nope"), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
