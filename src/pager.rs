//! Incremental loading of a user's Goals, plus the Goal write path.
//!
//! The pager owns its pagination cursor and a small state machine guarding
//! against overlapping page loads. State transitions are synchronous and take
//! a short lock; only the store calls suspend. Two callers racing `load_more`
//! therefore collapse to a single query: the loser observes `Fetching` and is
//! silently dropped, which is the deliberate guard against duplicate
//! "scroll near bottom" triggers.

use std::sync::{Arc, Mutex};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::paths::{self, DocPath};
use crate::store::{DocumentStore, Query, StoreError};
use crate::types::{FocusPointer, Goal, GoalStatus, LoadedGoal, Todo, decode, decode_entity, encode};

pub const INITIAL_PAGE_SIZE: usize = 5;
pub const NEXT_PAGE_SIZE: usize = 10;

/// Goals are paged in descending start-date order.
const ORDER_FIELD: &str = "startDate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Fetching,
    HasMore,
    Exhausted,
    Errored,
}

struct PagerInner {
    state: PagerState,
    cursor: Option<String>,
}

/// Input for creating or replacing a Goal's scalar fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
}

/// What `delete_goal` does with the Todos and Records under the Goal.
/// The store never cascades on its own, so orphaning is an explicit choice
/// here rather than an accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadePolicy {
    /// Delete only the Goal document; children stay behind unreachable from
    /// the goal list.
    Orphan,
    /// Delete every Record and Todo under the Goal first, clearing the Focus
    /// pointer if it targets one of them.
    Cascade,
}

pub struct GoalPager {
    store: Arc<dyn DocumentStore>,
    inner: Mutex<PagerInner>,
}

impl GoalPager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(PagerInner {
                state: PagerState::Idle,
                cursor: None,
            }),
        }
    }

    pub fn state(&self) -> PagerState {
        self.lock().state
    }

    /// Forget the cursor and return to `Idle` without issuing a query. The
    /// explicit way out of `Errored` when the UI does not want a fresh load.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = PagerState::Idle;
        inner.cursor = None;
    }

    /// Load the first page (size 5), starting over from any settled state.
    /// A call while a fetch is already in flight is dropped.
    pub async fn load_initial(&self, user_id: &str) -> SyncResult<Vec<LoadedGoal>> {
        {
            let mut inner = self.lock();
            if inner.state == PagerState::Fetching {
                debug!(user = user_id, "load_initial dropped: fetch in flight");
                return Ok(Vec::new());
            }
            inner.state = PagerState::Fetching;
        }
        let outcome = self
            .fetch_page(user_id, INITIAL_PAGE_SIZE, None)
            .await;
        self.settle(user_id, outcome, true)
    }

    /// Load the next page (size 10) strictly after the stored cursor. A no-op
    /// unless the pager is in `HasMore`; duplicate triggers while `Fetching`
    /// and calls after `Exhausted`/`Errored` are silently dropped.
    pub async fn load_more(&self, user_id: &str) -> SyncResult<Vec<LoadedGoal>> {
        let cursor = {
            let mut inner = self.lock();
            if inner.state != PagerState::HasMore {
                debug!(user = user_id, state = ?inner.state, "load_more dropped");
                return Ok(Vec::new());
            }
            inner.state = PagerState::Fetching;
            inner.cursor.clone()
        };
        let outcome = self.fetch_page(user_id, NEXT_PAGE_SIZE, cursor).await;
        self.settle(user_id, outcome, false)
    }

    fn settle(
        &self,
        user_id: &str,
        outcome: SyncResult<(Vec<LoadedGoal>, Option<String>, usize)>,
        initial: bool,
    ) -> SyncResult<Vec<LoadedGoal>> {
        let mut inner = self.lock();
        match outcome {
            Ok((goals, cursor, limit)) => {
                if goals.is_empty() {
                    inner.state = PagerState::Exhausted;
                    if initial {
                        inner.cursor = None;
                    }
                } else {
                    // A short page means the collection ran out.
                    inner.state = if goals.len() < limit {
                        PagerState::Exhausted
                    } else {
                        PagerState::HasMore
                    };
                    inner.cursor = cursor;
                }
                debug!(
                    user = user_id,
                    count = goals.len(),
                    state = ?inner.state,
                    "goal page loaded"
                );
                Ok(goals)
            }
            Err(err) => {
                // Cursor stays put so the same page can be re-attempted after
                // a restart via load_initial or reset.
                inner.state = PagerState::Errored;
                warn!(user = user_id, error = %err, "goal page load failed");
                Err(err)
            }
        }
    }

    async fn fetch_page(
        &self,
        user_id: &str,
        limit: usize,
        start_after: Option<String>,
    ) -> SyncResult<(Vec<LoadedGoal>, Option<String>, usize)> {
        let page = self
            .store
            .query(
                &paths::goals(user_id),
                Query {
                    order_by: ORDER_FIELD,
                    descending: true,
                    limit,
                    start_after,
                },
            )
            .await?;

        let goals = page
            .docs
            .iter()
            .map(|doc| decode_entity(doc, |g: &mut Goal, id| g.id = id))
            .collect::<SyncResult<Vec<_>>>()?;

        let focus_path = self.focus_path(user_id).await?;
        let loaded = try_join_all(goals.into_iter().map(|goal| {
            let store = Arc::clone(&self.store);
            let focus_path = focus_path.clone();
            async move {
                let todo_docs = store.list_all(&paths::todos(user_id, &goal.id)).await?;
                let mut todos = todo_docs
                    .iter()
                    .map(|doc| decode_entity(doc, |t: &mut Todo, id| t.id = id))
                    .collect::<SyncResult<Vec<_>>>()?;
                for todo in &mut todos {
                    todo.is_focus = focus_path
                        .as_ref()
                        .is_some_and(|p| p.contains_id(&todo.id));
                }
                Ok::<_, SyncError>(LoadedGoal { goal, todos })
            }
        }))
        .await?;

        Ok((loaded, page.cursor, limit))
    }

    /// The Focus pointer read is tolerant: an absent document means no focus.
    async fn focus_path(&self, user_id: &str) -> SyncResult<Option<DocPath>> {
        match self.store.get(&paths::focus(user_id)).await? {
            Some(doc) => {
                let pointer: FocusPointer = decode(&doc)?;
                Ok(Some(DocPath::from(pointer.todo_path)))
            }
            None => Ok(None),
        }
    }

    // Goal write path. These do not touch pagination state; the UI refreshes
    // through load_initial when it wants the new world.

    pub async fn create_goal(&self, user_id: &str, input: NewGoal) -> SyncResult<Goal> {
        validate_dates(&input)?;
        let goal = Goal {
            id: String::new(),
            title: input.title,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
        };
        let id = self
            .store
            .add(&paths::goals(user_id), encode(&goal)?)
            .await?;
        debug!(user = user_id, goal = %id, "goal created");
        Ok(Goal { id, ..goal })
    }

    pub async fn update_goal(&self, user_id: &str, goal_id: &str, input: NewGoal) -> SyncResult<Goal> {
        validate_dates(&input)?;
        let goal = Goal {
            id: goal_id.to_string(),
            title: input.title,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
        };
        self.store
            .update(&paths::goal(user_id, goal_id), encode(&goal)?)
            .await?;
        Ok(goal)
    }

    pub async fn delete_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        policy: CascadePolicy,
    ) -> SyncResult<()> {
        if policy == CascadePolicy::Cascade {
            self.cascade_children(user_id, goal_id).await?;
        }
        self.store.delete(&paths::goal(user_id, goal_id)).await?;
        debug!(user = user_id, goal = goal_id, ?policy, "goal deleted");
        Ok(())
    }

    async fn cascade_children(&self, user_id: &str, goal_id: &str) -> SyncResult<()> {
        let todo_docs = self.store.list_all(&paths::todos(user_id, goal_id)).await?;
        for todo_doc in &todo_docs {
            let todo_path = paths::todo(user_id, goal_id, &todo_doc.id);
            let record_docs = self
                .store
                .list_all(&todo_path.child(paths::RECORDS))
                .await?;
            for record_doc in &record_docs {
                self.store
                    .delete(&todo_path.child(paths::RECORDS).child(&record_doc.id))
                    .await?;
            }
            self.store.delete(&todo_path).await?;
        }

        // Drop the pointer if it targeted anything under this goal.
        if let Some(focus_path) = self.focus_path(user_id).await? {
            if focus_path.contains_id(goal_id) {
                match self.store.delete(&paths::focus(user_id)).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PagerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn validate_dates(input: &NewGoal) -> SyncResult<()> {
    if input.end_date < input.start_date {
        return Err(SyncError::Unclassified(format!(
            "endDate {} precedes startDate {}",
            input.end_date, input.start_date
        )));
    }
    Ok(())
}
