use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::board::context::BoardContext;
use crate::board::tasks::parse_tasks;
use crate::error::{BoardError, Result};
use crate::interfaces::store::{Document, Subscription, WriteOp};
use crate::model::{Column, DEFAULT_COLUMN, RESERVED_COLUMNS};

const ORDER_KEY: &str = "order";

/// Owns the ordered list of board columns for the signed-in user and
/// guarantees the three reserved columns exist.
pub struct ColumnStore {
    ctx: Arc<BoardContext>,
}

impl ColumnStore {
    pub fn new(ctx: Arc<BoardContext>) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> Result<Vec<Column>> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.columns_path(&user);
        let snapshot = self.ctx.store().read(&path, Some(ORDER_KEY)).await?;
        Ok(parse_columns(&snapshot))
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.columns_path(&user);
        self.ctx.store().subscribe(&path, Some(ORDER_KEY)).await
    }

    /// Creates whichever reserved columns are missing, as one batch of
    /// independent creates, then re-reads the collection for the
    /// generated ids. A missing reserved column takes its fixed order
    /// index unless an existing column already holds that value.
    pub async fn ensure_defaults(&self) -> Result<Vec<Column>> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.columns_path(&user);
        let existing = self.load().await?;

        let mut used: Vec<i64> = existing.iter().map(|c| c.order).collect();
        let mut ops = Vec::new();
        for (index, title) in RESERVED_COLUMNS.iter().enumerate() {
            if existing.iter().any(|c| c.title == *title) {
                continue;
            }
            let mut order = index as i64;
            if used.contains(&order) {
                order = used.iter().max().copied().unwrap_or(-1) + 1;
            }
            used.push(order);
            ops.push(WriteOp::Create {
                path: path.clone(),
                fields: column_fields(title, order)?,
            });
        }

        if ops.is_empty() {
            return Ok(existing);
        }
        info!(user = %user, missing = ops.len(), "bootstrapping reserved columns");
        self.ctx.store().write_batch(ops).await?;
        self.load().await
    }

    pub async fn add(&self, title: &str) -> Result<Column> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::Validation("column title is required".to_string()));
        }
        let user = self.ctx.require_user()?;
        let path = self.ctx.columns_path(&user);

        let existing = self.load().await?;
        let order = existing.iter().map(|c| c.order).max().map_or(0, |o| o + 1);
        let column = Column {
            id: String::new(),
            title: title.to_string(),
            order,
            created_at: Utc::now(),
        };
        let fields = serde_json::to_value(&column)
            .map_err(|e| BoardError::Serialization(e.to_string()))?;
        let id = self.ctx.store().create(&path, fields).await?;
        Ok(Column { id, ..column })
    }

    /// Deletes a non-reserved column. Its tasks are first re-pointed at
    /// the "To Do" column as a batch of independent merges; if "To Do"
    /// cannot be located the relocation is skipped and the projection's
    /// dangling-status fallback picks the tasks up later.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.ctx.require_user()?;
        let columns = self.load().await?;
        let column = columns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| BoardError::NotFound(format!("column {id}")))?;
        if column.is_reserved() {
            return Err(BoardError::Protected(column.title.clone()));
        }

        match columns.iter().find(|c| c.title == DEFAULT_COLUMN) {
            Some(fallback) => self.relocate_tasks(&user, id, &fallback.id).await?,
            None => {
                warn!(column = %column.title, "\"To Do\" column missing, deleting without relocating tasks");
            }
        }

        let path = self.ctx.columns_path(&user);
        self.ctx.store().delete(&path, id).await
    }

    async fn relocate_tasks(&self, user: &str, from_column: &str, to_column: &str) -> Result<()> {
        let tasks_path = self.ctx.tasks_path(user);
        let snapshot = self.ctx.store().read(&tasks_path, None).await?;
        let ops: Vec<WriteOp> = parse_tasks(&snapshot)
            .into_iter()
            .filter(|task| task.status == from_column)
            .map(|task| WriteOp::Merge {
                path: tasks_path.clone(),
                id: task.id,
                patch: json!({ "status": to_column }),
            })
            .collect();
        if ops.is_empty() {
            return Ok(());
        }
        info!(count = ops.len(), "relocating tasks from deleted column");
        self.ctx.store().write_batch(ops).await
    }
}

fn column_fields(title: &str, order: i64) -> Result<serde_json::Value> {
    let column = Column {
        id: String::new(),
        title: title.to_string(),
        order,
        created_at: Utc::now(),
    };
    serde_json::to_value(&column).map_err(|e| BoardError::Serialization(e.to_string()))
}

pub(crate) fn parse_columns(snapshot: &[Document]) -> Vec<Column> {
    snapshot
        .iter()
        .filter_map(|doc| match Column::from_document(doc) {
            Ok(column) => Some(column),
            Err(err) => {
                warn!(id = %doc.id, "skipping malformed column: {err}");
                None
            }
        })
        .collect()
}
