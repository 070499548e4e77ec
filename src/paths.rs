//! Canonical document addresses.
//!
//! The remote store is hierarchical: `users/{uid}/goals/{gid}/todos/{tid}/records/{rid}`,
//! with the per-user Focus pointer living outside the goal tree at
//! `users/{uid}/focus/current`. These builders are pure; they do no I/O and no
//! validation. Empty identifiers are an input-contract violation that the facade
//! rejects before any path is built.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const USERS: &str = "users";
pub const GOALS: &str = "goals";
pub const TODOS: &str = "todos";
pub const RECORDS: &str = "records";
pub const FOCUS: &str = "focus";
pub const FOCUS_DOC: &str = "current";

/// Slash-joined address of a document or collection in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath(String);

impl DocPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the document `id` inside this collection.
    pub fn child(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{}", self.0, id))
    }

    /// Whether `id` appears as a whole segment of this path. The Focus pointer
    /// stores a full `users/../goals/../todos/..` path, so focus checks are
    /// containment checks, not equality checks.
    pub fn contains_id(&self, id: &str) -> bool {
        !id.is_empty() && self.0.split('/').any(|segment| segment == id)
    }

    /// Identifier of the addressed document (the final segment).
    pub fn doc_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocPath {
    fn from(raw: String) -> Self {
        DocPath(raw)
    }
}

pub fn user(user_id: &str) -> DocPath {
    DocPath(format!("{USERS}/{user_id}"))
}

pub fn goals(user_id: &str) -> DocPath {
    DocPath(format!("{USERS}/{user_id}/{GOALS}"))
}

pub fn goal(user_id: &str, goal_id: &str) -> DocPath {
    DocPath(format!("{USERS}/{user_id}/{GOALS}/{goal_id}"))
}

pub fn todos(user_id: &str, goal_id: &str) -> DocPath {
    DocPath(format!("{USERS}/{user_id}/{GOALS}/{goal_id}/{TODOS}"))
}

pub fn todo(user_id: &str, goal_id: &str, todo_id: &str) -> DocPath {
    DocPath(format!(
        "{USERS}/{user_id}/{GOALS}/{goal_id}/{TODOS}/{todo_id}"
    ))
}

pub fn records(user_id: &str, goal_id: &str, todo_id: &str) -> DocPath {
    DocPath(format!(
        "{USERS}/{user_id}/{GOALS}/{goal_id}/{TODOS}/{todo_id}/{RECORDS}"
    ))
}

pub fn record(user_id: &str, goal_id: &str, todo_id: &str, record_id: &str) -> DocPath {
    records(user_id, goal_id, todo_id).child(record_id)
}

/// The singleton Focus pointer document for a user.
pub fn focus(user_id: &str) -> DocPath {
    DocPath(format!("{USERS}/{user_id}/{FOCUS}/{FOCUS_DOC}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_deterministic() {
        assert_eq!(user("u1").as_str(), "users/u1");
        assert_eq!(goal("u1", "g1").as_str(), "users/u1/goals/g1");
        assert_eq!(
            record("u1", "g1", "t1", "r1").as_str(),
            "users/u1/goals/g1/todos/t1/records/r1"
        );
        assert_eq!(focus("u1").as_str(), "users/u1/focus/current");
    }

    #[test]
    fn containment_matches_whole_segments_only() {
        let path = todo("u1", "g1", "t12");
        assert!(path.contains_id("t12"));
        assert!(!path.contains_id("t1"));
        assert!(!path.contains_id(""));
    }

    #[test]
    fn doc_id_is_final_segment() {
        assert_eq!(todo("u1", "g1", "t1").doc_id(), "t1");
        assert_eq!(focus("u1").doc_id(), FOCUS_DOC);
    }
}
