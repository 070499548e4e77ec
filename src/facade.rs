//! Composed public surface for the UI/application layer.
//!
//! The facade validates identity input, dispatches to the components, and
//! classifies every failure exactly once against the connectivity oracle
//! before handing it upward. Callers pick "retry" vs. "queued for delivery"
//! messaging from [`SyncError::class`]; nothing here retries automatically.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::assets::AssetFetcher;
use crate::connectivity::ConnectivityOracle;
use crate::error::{SyncError, SyncResult};
use crate::focus::FocusCoordinator;
use crate::pager::{CascadePolicy, GoalPager, NewGoal};
use crate::paths;
use crate::records::{NewTodo, RecordStore, TodoRef, TodoStore};
use crate::store::{BlobStore, DocumentStore};
use crate::types::{Goal, LoadedGoal, Record, Todo, User, decode_entity, encode};

/// Parent address shared by all profile image assets.
const PROFILE_IMAGE_PARENT: &str = "profile_images";

pub struct SyncFacade {
    store: Arc<dyn DocumentStore>,
    oracle: Arc<dyn ConnectivityOracle>,
    pager: GoalPager,
    focus: FocusCoordinator,
    todos: TodoStore,
    records: RecordStore,
    assets: AssetFetcher,
}

impl SyncFacade {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        oracle: Arc<dyn ConnectivityOracle>,
    ) -> Self {
        let focus = FocusCoordinator::new(store.clone());
        Self {
            pager: GoalPager::new(store.clone()),
            todos: TodoStore::new(store.clone(), focus.clone()),
            records: RecordStore::new(store.clone(), focus.clone()),
            assets: AssetFetcher::new(blobs, PROFILE_IMAGE_PARENT),
            focus,
            oracle,
            store,
        }
    }

    /// Pagination state, exposed for the UI's scroll/retry affordances.
    pub fn pager_state(&self) -> crate::pager::PagerState {
        self.pager.state()
    }

    pub fn reset_pager(&self) {
        self.pager.reset();
    }

    // Goals

    pub async fn load_initial_goals(&self, user_id: &str) -> SyncResult<Vec<LoadedGoal>> {
        require_user(user_id)?;
        self.finish(self.pager.load_initial(user_id).await)
    }

    pub async fn load_more_goals(&self, user_id: &str) -> SyncResult<Vec<LoadedGoal>> {
        require_user(user_id)?;
        self.finish(self.pager.load_more(user_id).await)
    }

    pub async fn create_goal(&self, user_id: &str, input: NewGoal) -> SyncResult<Goal> {
        require_user(user_id)?;
        self.finish(self.pager.create_goal(user_id, input).await)
    }

    pub async fn update_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        input: NewGoal,
    ) -> SyncResult<Goal> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        self.finish(self.pager.update_goal(user_id, goal_id, input).await)
    }

    pub async fn delete_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        policy: CascadePolicy,
    ) -> SyncResult<()> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        self.finish(self.pager.delete_goal(user_id, goal_id, policy).await)
    }

    // Todos

    pub async fn create_todo(
        &self,
        user_id: &str,
        goal_id: &str,
        input: NewTodo,
    ) -> SyncResult<Todo> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        self.finish(self.todos.create_todo(user_id, goal_id, input).await)
    }

    pub async fn update_todo(
        &self,
        user_id: &str,
        goal_id: &str,
        todo_id: &str,
        input: NewTodo,
    ) -> SyncResult<Todo> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        require_id(todo_id, "todo id")?;
        self.finish(self.todos.update_todo(user_id, goal_id, todo_id, input).await)
    }

    pub async fn delete_todo(
        &self,
        user_id: &str,
        goal_id: &str,
        todo_id: &str,
    ) -> SyncResult<()> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        require_id(todo_id, "todo id")?;
        self.finish(self.todos.delete_todo(user_id, goal_id, todo_id).await)
    }

    // Focus

    pub async fn set_focus(&self, user_id: &str, goal_id: &str, todo_id: &str) -> SyncResult<()> {
        require_user(user_id)?;
        require_id(goal_id, "goal id")?;
        require_id(todo_id, "todo id")?;
        let path = paths::todo(user_id, goal_id, todo_id);
        self.finish(self.focus.set_focus(user_id, &path).await)
    }

    pub async fn clear_focus(&self, user_id: &str) -> SyncResult<()> {
        require_user(user_id)?;
        self.finish(self.focus.clear_focus(user_id).await)
    }

    // Records

    /// Records for the referenced Todo, newest first. With `TodoRef::Focused`
    /// and no focus set (or a stale pointer), this is an empty list, not an
    /// error: an unresolvable focus reads the same as no focus.
    pub async fn list_records(
        &self,
        user_id: &str,
        todo_ref: TodoRef<'_>,
    ) -> SyncResult<Vec<Record>> {
        require_user(user_id)?;
        let resolved = match self.records.resolve_owning_todo(user_id, todo_ref).await {
            Ok(path) => path,
            Err(SyncError::NoFocus) => return Ok(Vec::new()),
            Err(err) => return Err(self.classify(err)),
        };
        self.finish(self.records.list(&resolved).await)
    }

    pub async fn create_record(
        &self,
        user_id: &str,
        todo_ref: TodoRef<'_>,
        record: &Record,
    ) -> SyncResult<Record> {
        require_user(user_id)?;
        let resolved = self
            .records
            .resolve_owning_todo(user_id, todo_ref)
            .await
            .map_err(|err| self.classify(err))?;
        self.finish(self.records.create(&resolved, record).await)
    }

    pub async fn update_record(
        &self,
        user_id: &str,
        todo_ref: TodoRef<'_>,
        record_id: &str,
        record: &Record,
    ) -> SyncResult<()> {
        require_user(user_id)?;
        require_id(record_id, "record id")?;
        let resolved = self
            .records
            .resolve_owning_todo(user_id, todo_ref)
            .await
            .map_err(|err| self.classify(err))?;
        self.finish(self.records.update(&resolved, record_id, record).await)
    }

    pub async fn delete_record(
        &self,
        user_id: &str,
        todo_ref: TodoRef<'_>,
        record_id: &str,
    ) -> SyncResult<()> {
        require_user(user_id)?;
        require_id(record_id, "record id")?;
        let resolved = self
            .records
            .resolve_owning_todo(user_id, todo_ref)
            .await
            .map_err(|err| self.classify(err))?;
        self.finish(self.records.delete(&resolved, record_id).await)
    }

    // Assets

    pub async fn resolve_assets(
        &self,
        names: HashSet<String>,
    ) -> SyncResult<HashMap<String, String>> {
        self.finish(self.assets.resolve_all(names).await)
    }

    // Profile

    /// The User document is explicitly addressed, so genuine absence is a
    /// `NotFound` error here, unlike the Focus pointer.
    pub async fn load_profile(&self, user_id: &str) -> SyncResult<User> {
        require_user(user_id)?;
        let result = async {
            let path = paths::user(user_id);
            let doc = self
                .store
                .get(&path)
                .await?
                .ok_or_else(|| SyncError::NotFound(path.as_str().to_string()))?;
            decode_entity(&doc, |u: &mut User, id| u.id = id)
        }
        .await;
        self.finish(result)
    }

    pub async fn update_profile(&self, user_id: &str, profile: &User) -> SyncResult<()> {
        require_user(user_id)?;
        let result = async {
            self.store
                .set(&paths::user(user_id), encode(profile)?)
                .await?;
            Ok(())
        }
        .await;
        self.finish(result)
    }

    fn finish<T>(&self, result: SyncResult<T>) -> SyncResult<T> {
        result.map_err(|err| self.classify(err))
    }

    fn classify(&self, err: SyncError) -> SyncError {
        let online = self.oracle.is_online();
        let classified = err.classify(online);
        debug!(online, class = ?classified.class(), error = %classified, "failure classified");
        classified
    }
}

fn require_user(user_id: &str) -> SyncResult<()> {
    if user_id.trim().is_empty() {
        return Err(SyncError::Identity);
    }
    Ok(())
}

fn require_id(id: &str, what: &str) -> SyncResult<()> {
    if id.trim().is_empty() {
        return Err(SyncError::Unclassified(format!("empty {what}")));
    }
    Ok(())
}
