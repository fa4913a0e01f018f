use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::board::columns::parse_columns;
use crate::board::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::interfaces::store::{Document, Subscription};
use crate::model::{Task, TaskDraft, DEFAULT_COLUMN};

/// Description stored when a task is created without one.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided.";

/// Owns the set of tasks for the signed-in user. Status changes travel
/// only through [`TaskStore::move_to`]; every other write leaves status
/// untouched so a stale edit cannot undo a concurrent move.
pub struct TaskStore {
    ctx: Arc<BoardContext>,
}

impl TaskStore {
    pub fn new(ctx: Arc<BoardContext>) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> Result<Vec<Task>> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.tasks_path(&user);
        let snapshot = self.ctx.store().read(&path, None).await?;
        Ok(parse_tasks(&snapshot))
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.tasks_path(&user);
        self.ctx.store().subscribe(&path, None).await
    }

    /// Creates a task in the "To Do" column with an empty checklist.
    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(BoardError::Validation("task title is required".to_string()));
        }
        let user = self.ctx.require_user()?;

        let columns_path = self.ctx.columns_path(&user);
        let columns = parse_columns(&self.ctx.store().read(&columns_path, None).await?);
        let default_column = columns
            .iter()
            .find(|c| c.title == DEFAULT_COLUMN)
            .ok_or_else(|| BoardError::NotFound(format!("column \"{DEFAULT_COLUMN}\"")))?;

        let description = draft.description.trim();
        let task = Task {
            id: String::new(),
            title: title.to_string(),
            description: if description.is_empty() {
                DESCRIPTION_PLACEHOLDER.to_string()
            } else {
                description.to_string()
            },
            start_date: draft.start_date,
            end_date: draft.end_date,
            assigned_to: draft.assigned_to,
            checklist: Vec::new(),
            status: default_column.id.clone(),
            created_at: Utc::now(),
        };
        let fields =
            serde_json::to_value(&task).map_err(|e| BoardError::Serialization(e.to_string()))?;
        let path = self.ctx.tasks_path(&user);
        let id = self.ctx.store().create(&path, fields).await?;
        Ok(Task { id, ..task })
    }

    /// Whole-record merge excluding `status`.
    pub async fn update(&self, task: &Task) -> Result<()> {
        if task.title.trim().is_empty() {
            return Err(BoardError::Validation("task title is required".to_string()));
        }
        let user = self.ctx.require_user()?;
        let mut patch =
            serde_json::to_value(task).map_err(|e| BoardError::Serialization(e.to_string()))?;
        if let Some(fields) = patch.as_object_mut() {
            fields.remove("status");
        }
        let path = self.ctx.tasks_path(&user);
        self.ctx.store().merge(&path, &task.id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.tasks_path(&user);
        self.ctx.store().delete(&path, id).await
    }

    /// Flips `completed` on one checklist item and writes the checklist
    /// back wholesale; embedded arrays are never patched per item.
    pub async fn toggle_checklist(&self, task_id: &str, item_id: &str) -> Result<Task> {
        let user = self.ctx.require_user()?;
        let mut task = self
            .load()
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
        let item = task
            .checklist
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| BoardError::NotFound(format!("checklist item {item_id}")))?;
        item.completed = !item.completed;

        let checklist = serde_json::to_value(&task.checklist)
            .map_err(|e| BoardError::Serialization(e.to_string()))?;
        let path = self.ctx.tasks_path(&user);
        self.ctx
            .store()
            .merge(&path, task_id, json!({ "checklist": checklist }))
            .await?;
        Ok(task)
    }

    /// Merge-writes `status`; a no-op when the task already lives in the
    /// target column.
    pub async fn move_to(&self, task_id: &str, column_id: &str) -> Result<()> {
        let user = self.ctx.require_user()?;
        let task = self
            .load()
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
        if task.status == column_id {
            debug!(task = %task_id, "move target equals current column, skipping write");
            return Ok(());
        }
        let path = self.ctx.tasks_path(&user);
        self.ctx
            .store()
            .merge(&path, task_id, json!({ "status": column_id }))
            .await
    }
}

pub(crate) fn parse_tasks(snapshot: &[Document]) -> Vec<Task> {
    snapshot
        .iter()
        .filter_map(|doc| match Task::from_document(doc) {
            Ok(task) => Some(task),
            Err(err) => {
                warn!(id = %doc.id, "skipping malformed task: {err}");
                None
            }
        })
        .collect()
}
