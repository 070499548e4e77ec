//! Focus pointer coordination.
//!
//! Exactly one pointer document per user names the currently focused Todo by
//! its full path. The pointer is a weak cross-reference: it never keeps the
//! Todo alive, the store enforces no referential integrity, and consistency
//! under Todo mutation is caller discipline (see `records::TodoStore`).
//! Readers must tolerate a stale pointer by treating it as "no focus".

use std::sync::Arc;

use tracing::debug;

use crate::error::SyncResult;
use crate::paths::{self, DocPath};
use crate::store::{DocumentStore, StoreError};
use crate::types::{FocusPointer, decode, encode};

#[derive(Clone)]
pub struct FocusCoordinator {
    store: Arc<dyn DocumentStore>,
}

impl FocusCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Path of the currently focused Todo, or `None` when no focus is set.
    /// An absent pointer document is the normal "no focus" state, not an error.
    pub async fn focused_todo_path(&self, user_id: &str) -> SyncResult<Option<DocPath>> {
        let pointer_path = paths::focus(user_id);
        match self.store.get(&pointer_path).await? {
            Some(doc) => {
                let pointer: FocusPointer = decode(&doc)?;
                Ok(Some(DocPath::from(pointer.todo_path)))
            }
            None => Ok(None),
        }
    }

    /// Idempotent overwrite of the pointer. Re-focusing the same Todo is fine;
    /// focusing a different one replaces the previous target, preserving the
    /// at-most-one invariant by construction (there is only one pointer doc).
    pub async fn set_focus(&self, user_id: &str, todo_path: &DocPath) -> SyncResult<()> {
        let pointer = FocusPointer {
            todo_path: todo_path.as_str().to_string(),
        };
        self.store
            .set(&paths::focus(user_id), encode(&pointer)?)
            .await?;
        debug!(user = user_id, todo = %todo_path, "focus set");
        Ok(())
    }

    /// Delete the pointer. Clearing an already-absent pointer is a no-op.
    pub async fn clear_focus(&self, user_id: &str) -> SyncResult<()> {
        match self.store.delete(&paths::focus(user_id)).await {
            Ok(()) => {
                debug!(user = user_id, "focus cleared");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
