use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::interfaces::store::Document;

/// Column titles that are bootstrapped on first load and can never be
/// deleted. Their bootstrap `order` is their index in this array.
pub const RESERVED_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

/// Title of the column that receives new tasks and relocated orphans.
pub const DEFAULT_COLUMN: &str = "To Do";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    /// Display sort key, ascending. Unique per board, gaps permitted,
    /// never renumbered.
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

impl Column {
    pub fn is_reserved(&self) -> bool {
        RESERVED_COLUMNS.contains(&self.title.as_str())
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        decode(doc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Serialized as explicit `null` when unset so a whole-record merge
    /// can clear a previously stored date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Weak reference to a personnel record by name. Renames and deletes
    /// do not cascade here; consumers treat unknown names as unassigned.
    /// `null` on the wire when unassigned, for the same merge reason.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    /// Id of the column this task currently belongs to.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn from_document(doc: &Document) -> Result<Self> {
        decode(doc)
    }
}

/// Caller-supplied fields for a new task. Everything the store defaults
/// (description placeholder, status, checklist, timestamp) stays out.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personnel {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Personnel {
    pub fn from_document(doc: &Document) -> Result<Self> {
        decode(doc)
    }
}

fn decode<T>(doc: &Document) -> Result<T>
where
    T: serde::de::DeserializeOwned + WithId,
{
    let mut record: T = serde_json::from_value(doc.fields.clone())
        .map_err(|e| BoardError::Serialization(e.to_string()))?;
    record.set_id(&doc.id);
    Ok(record)
}

trait WithId {
    fn set_id(&mut self, id: &str);
}

macro_rules! with_id {
    ($($ty:ty),*) => {
        $(impl WithId for $ty {
            fn set_id(&mut self, id: &str) {
                self.id = id.to_string();
            }
        })*
    };
}

with_id!(Column, Task, Personnel);
