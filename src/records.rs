//! Todo and Record persistence.
//!
//! `TodoStore` owns the caller-discipline side of the focus invariant: every
//! Todo mutation that changes focus intent, and every Todo deletion, keeps the
//! Focus pointer consistent. `RecordStore` is plain CRUD under a resolved Todo
//! reference; none of its operations touch the pointer or any Todo/Goal doc.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::focus::FocusCoordinator;
use crate::paths::{self, DocPath};
use crate::store::DocumentStore;
use crate::types::{GoalStatus, Record, Todo, decode_entity, encode, sort_records_newest_first};

/// Input for creating a Todo. `is_focus` is intent, not a stored field.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
    #[serde(default)]
    pub is_focus: bool,
}

#[derive(Clone)]
pub struct TodoStore {
    store: Arc<dyn DocumentStore>,
    focus: FocusCoordinator,
}

impl TodoStore {
    pub fn new(store: Arc<dyn DocumentStore>, focus: FocusCoordinator) -> Self {
        Self { store, focus }
    }

    pub async fn create_todo(
        &self,
        user_id: &str,
        goal_id: &str,
        input: NewTodo,
    ) -> SyncResult<Todo> {
        let todo = Todo {
            id: String::new(),
            title: input.title,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            is_focus: input.is_focus,
        };
        let id = self
            .store
            .add(&paths::todos(user_id, goal_id), encode(&todo)?)
            .await?;
        let todo = Todo { id, ..todo };

        if input.is_focus {
            let path = paths::todo(user_id, goal_id, &todo.id);
            self.focus.set_focus(user_id, &path).await?;
        }
        debug!(user = user_id, goal = goal_id, todo = %todo.id, "todo created");
        Ok(todo)
    }

    /// Replace the Todo's scalar fields and reconcile the Focus pointer with
    /// the new focus intent: flipping to true overwrites the pointer, flipping
    /// to false clears it only if this Todo was the current target.
    pub async fn update_todo(
        &self,
        user_id: &str,
        goal_id: &str,
        todo_id: &str,
        input: NewTodo,
    ) -> SyncResult<Todo> {
        let path = paths::todo(user_id, goal_id, todo_id);
        let todo = Todo {
            id: todo_id.to_string(),
            title: input.title,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            is_focus: input.is_focus,
        };
        self.store.update(&path, encode(&todo)?).await?;

        if input.is_focus {
            self.focus.set_focus(user_id, &path).await?;
        } else if self.points_at(user_id, todo_id).await? {
            self.focus.clear_focus(user_id).await?;
        }
        Ok(todo)
    }

    /// Delete the Todo, clearing the Focus pointer first when it targets this
    /// Todo so no window leaves the pointer dangling after the delete lands.
    pub async fn delete_todo(&self, user_id: &str, goal_id: &str, todo_id: &str) -> SyncResult<()> {
        if self.points_at(user_id, todo_id).await? {
            self.focus.clear_focus(user_id).await?;
        }
        self.store
            .delete(&paths::todo(user_id, goal_id, todo_id))
            .await?;
        debug!(user = user_id, goal = goal_id, todo = todo_id, "todo deleted");
        Ok(())
    }

    async fn points_at(&self, user_id: &str, todo_id: &str) -> SyncResult<bool> {
        Ok(self
            .focus
            .focused_todo_path(user_id)
            .await?
            .is_some_and(|p| p.contains_id(todo_id)))
    }
}

/// Reference to the Todo owning a set of Records: explicit ids, or "whatever
/// is currently in focus".
#[derive(Clone, Copy, Debug)]
pub enum TodoRef<'a> {
    Explicit { goal_id: &'a str, todo_id: &'a str },
    Focused,
}

#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn DocumentStore>,
    focus: FocusCoordinator,
}

impl RecordStore {
    pub fn new(store: Arc<dyn DocumentStore>, focus: FocusCoordinator) -> Self {
        Self { store, focus }
    }

    /// Resolve the owning Todo's path. Explicit ids resolve directly; the
    /// focused variant goes through the pointer and fails with [`SyncError::NoFocus`]
    /// when none is set. No existence check is made either way; a stale
    /// pointer resolves to a path whose record collection simply reads empty.
    pub async fn resolve_owning_todo(
        &self,
        user_id: &str,
        todo_ref: TodoRef<'_>,
    ) -> SyncResult<DocPath> {
        match todo_ref {
            TodoRef::Explicit { goal_id, todo_id } => Ok(paths::todo(user_id, goal_id, todo_id)),
            TodoRef::Focused => self
                .focus
                .focused_todo_path(user_id)
                .await?
                .ok_or(SyncError::NoFocus),
        }
    }

    /// All Records under the Todo, newest date first.
    pub async fn list(&self, todo_path: &DocPath) -> SyncResult<Vec<Record>> {
        let collection = todo_path.child(paths::RECORDS);
        let docs = self.store.list_all(&collection).await?;
        let mut records = docs
            .iter()
            .map(|doc| decode_entity(doc, |r: &mut Record, id| r.id = id))
            .collect::<SyncResult<Vec<_>>>()?;
        sort_records_newest_first(&mut records);
        Ok(records)
    }

    pub async fn create(&self, todo_path: &DocPath, record: &Record) -> SyncResult<Record> {
        let collection = todo_path.child(paths::RECORDS);
        let id = self.store.add(&collection, encode(record)?).await?;
        debug!(todo = %todo_path, record = %id, "record created");
        Ok(Record {
            id,
            ..record.clone()
        })
    }

    /// Last write wins; no optimistic-concurrency check.
    pub async fn update(
        &self,
        todo_path: &DocPath,
        record_id: &str,
        record: &Record,
    ) -> SyncResult<()> {
        let path = todo_path.child(paths::RECORDS).child(record_id);
        self.store.update(&path, encode(record)?).await?;
        Ok(())
    }

    pub async fn delete(&self, todo_path: &DocPath, record_id: &str) -> SyncResult<()> {
        let path = todo_path.child(paths::RECORDS).child(record_id);
        self.store.delete(&path).await?;
        Ok(())
    }
}
