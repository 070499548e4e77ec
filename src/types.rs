use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{SyncError, SyncResult};
use crate::store::Document;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalStatus {
    Unachieved,
    Achieved,
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Unachieved
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    /// Empty string means no profile image has been set.
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
    #[serde(default)]
    pub future: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
    /// Derived from the Focus pointer at read time; never stored on the Todo.
    #[serde(skip)]
    pub is_focus: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub date: DateTime<Utc>,
    pub comment: String,
}

/// The singleton per-user pointer naming the currently focused Todo by its
/// full `users/../goals/../todos/..` path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusPointer {
    pub todo_path: String,
}

/// A Goal as the pager returns it: scalar fields plus its expanded Todos with
/// focus-derived flags.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGoal {
    pub goal: Goal,
    pub todos: Vec<Todo>,
}

/// Strict decode of a store document into a typed value.
///
/// Any missing or mistyped field fails the whole document with a `Decode`
/// error carrying the document path (missing fields are reported by name in
/// the serde error). No silent defaulting of broken data.
pub fn decode<T: DeserializeOwned>(doc: &Document) -> SyncResult<T> {
    serde_json::from_value(doc.data.clone()).map_err(|source| SyncError::Decode {
        path: doc.id.clone(),
        source,
    })
}

/// Decode plus id assignment for entity types that carry their store id.
pub fn decode_entity<T>(doc: &Document, assign: impl FnOnce(&mut T, String)) -> SyncResult<T>
where
    T: DeserializeOwned,
{
    let mut value: T = decode(doc)?;
    assign(&mut value, doc.id.clone());
    Ok(value)
}

/// Serialize a wire-facing value into a store document body.
pub fn encode<T: Serialize>(value: &T) -> SyncResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| SyncError::Unclassified(e.to_string()))
}

/// Newest-first ordering used everywhere Records are listed.
pub fn sort_records_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}
