//! Sync and consistency layer for a personal goal tracker.
//!
//! Goals own Todos, Todos own timestamped Records, and at most one Todo per
//! account is "in focus" at a time via a singleton pointer document. All data
//! lives in a remote hierarchical document store reached through the
//! [`store::DocumentStore`] boundary; this crate supplies the read/write API,
//! cursor pagination over Goals, the focus invariant discipline, concurrent
//! asset resolution, and a uniform retryable/fatal failure vocabulary so the
//! UI can stay usable offline.
//!
//! The application layer talks to [`SyncFacade`]; everything else is exposed
//! for composition roots that want to wire components individually.

pub mod assets;
pub mod connectivity;
pub mod error;
pub mod facade;
pub mod focus;
pub mod pager;
pub mod paths;
pub mod records;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::AssetFetcher;
pub use connectivity::{ConnectivityOracle, NetworkWatcher, StaticOracle};
pub use error::{ErrorClass, SyncError, SyncResult};
pub use facade::SyncFacade;
pub use focus::FocusCoordinator;
pub use pager::{CascadePolicy, GoalPager, NewGoal, PagerState};
pub use records::{NewTodo, RecordStore, TodoRef, TodoStore};
pub use store::{BlobStore, Document, DocumentStore, Query, QueryPage, StoreError};
pub use types::{FocusPointer, Goal, GoalStatus, LoadedGoal, Record, Todo, User};
