use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::board::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::interfaces::store::{Document, Subscription};
use crate::model::Personnel;

/// Owns the set of assignable people for the signed-in user. Deleting a
/// person does not cascade to tasks that reference the name.
pub struct PersonnelStore {
    ctx: Arc<BoardContext>,
}

impl PersonnelStore {
    pub fn new(ctx: Arc<BoardContext>) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> Result<Vec<Personnel>> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.personnel_path(&user);
        let snapshot = self.ctx.store().read(&path, None).await?;
        Ok(parse_personnel(&snapshot))
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.personnel_path(&user);
        self.ctx.store().subscribe(&path, None).await
    }

    pub async fn add(&self, name: &str) -> Result<Personnel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::Validation(
                "personnel name is required".to_string(),
            ));
        }
        let user = self.ctx.require_user()?;
        let person = Personnel {
            id: String::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let fields =
            serde_json::to_value(&person).map_err(|e| BoardError::Serialization(e.to_string()))?;
        let path = self.ctx.personnel_path(&user);
        let id = self.ctx.store().create(&path, fields).await?;
        Ok(Personnel { id, ..person })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.ctx.require_user()?;
        let path = self.ctx.personnel_path(&user);
        self.ctx.store().delete(&path, id).await
    }
}

pub(crate) fn parse_personnel(snapshot: &[Document]) -> Vec<Personnel> {
    snapshot
        .iter()
        .filter_map(|doc| match Personnel::from_document(doc) {
            Ok(person) => Some(person),
            Err(err) => {
                warn!(id = %doc.id, "skipping malformed personnel record: {err}");
                None
            }
        })
        .collect()
}
