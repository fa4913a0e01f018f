use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use corkboard::board::context::BoardContext;
use corkboard::board::engine::BoardEngine;
use corkboard::board::projection::ColumnView;
use corkboard::error::{BoardError, Result};
use corkboard::interfaces::store::{DocumentStore, Snapshot, Subscription, WriteOp};
use corkboard::model::{ChecklistItem, TaskDraft};
use corkboard::providers::memory::{LocalIdentity, MemoryStore};

async fn open_board() -> Arc<BoardEngine> {
    let ctx = BoardContext::in_memory("corkboard");
    Arc::new(BoardEngine::open(ctx).await.unwrap())
}

fn column_by_title<'a>(views: &'a [ColumnView], title: &str) -> &'a ColumnView {
    views
        .iter()
        .find(|v| v.column.title == title)
        .unwrap_or_else(|| panic!("no column titled {title}"))
}

#[tokio::test]
async fn drag_scenario_moves_task_between_columns() {
    let engine = open_board().await;

    let review = engine.columns().add("Review").await.unwrap();
    assert_eq!(review.order, 3);
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    engine.refresh().await.unwrap();

    engine.begin_drag(&task.id).await.unwrap();
    engine.drop_on(&review.id).await.unwrap();

    // The optimistic projection already shows the move.
    let views = engine.view().await;
    let review_view = column_by_title(&views, "Review");
    assert_eq!(review_view.tasks.len(), 1);
    assert_eq!(review_view.tasks[0].title, "Write spec");
    assert!(column_by_title(&views, "To Do").tasks.is_empty());

    // So does the authoritative state after a reload.
    engine.refresh().await.unwrap();
    let views = engine.view().await;
    assert_eq!(column_by_title(&views, "Review").tasks.len(), 1);
    assert!(column_by_title(&views, "To Do").tasks.is_empty());
}

#[tokio::test]
async fn repeated_move_to_same_column_is_idempotent() {
    let engine = open_board().await;
    let review = engine.columns().add("Review").await.unwrap();
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();

    engine.tasks().move_to(&task.id, &review.id).await.unwrap();
    engine.refresh().await.unwrap();
    let once = engine.view().await;

    engine.tasks().move_to(&task.id, &review.id).await.unwrap();
    engine.refresh().await.unwrap();
    assert_eq!(engine.view().await, once);
}

#[tokio::test]
async fn dropping_on_the_source_column_is_a_no_op() {
    let engine = open_board().await;
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    engine.refresh().await.unwrap();
    let before = engine.view().await;

    engine.begin_drag(&task.id).await.unwrap();
    let to_do = column_by_title(&before, "To Do").column.id.clone();
    engine.drop_on(&to_do).await.unwrap();

    assert_eq!(engine.view().await, before);
    // The gesture is over; another drag can start.
    engine.begin_drag(&task.id).await.unwrap();
    engine.cancel_drag().await.unwrap();
}

#[tokio::test]
async fn cancelled_drag_mutates_nothing() {
    let engine = open_board().await;
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    engine.refresh().await.unwrap();
    let before = engine.view().await;

    engine.begin_drag(&task.id).await.unwrap();
    engine.cancel_drag().await.unwrap();

    engine.refresh().await.unwrap();
    assert_eq!(engine.view().await, before);
}

#[tokio::test]
async fn drop_without_a_drag_is_rejected() {
    let engine = open_board().await;
    let views = engine.view().await;
    let to_do = column_by_title(&views, "To Do").column.id.clone();
    assert!(matches!(
        engine.drop_on(&to_do).await,
        Err(BoardError::Validation(_))
    ));
    assert!(matches!(
        engine.cancel_drag().await,
        Err(BoardError::Validation(_))
    ));
}

#[tokio::test]
async fn reserved_columns_cannot_be_deleted() {
    let engine = open_board().await;
    let views = engine.view().await;
    let done = column_by_title(&views, "Done").column.id.clone();

    let err = engine.columns().delete(&done).await.unwrap_err();
    assert!(matches!(err, BoardError::Protected(ref title) if title == "Done"));

    engine.refresh().await.unwrap();
    assert_eq!(engine.view().await.len(), 3);
}

#[tokio::test]
async fn deleting_a_column_relocates_its_tasks_to_to_do() {
    let engine = open_board().await;
    let review = engine.columns().add("Review").await.unwrap();
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    engine.tasks().move_to(&task.id, &review.id).await.unwrap();

    engine.columns().delete(&review.id).await.unwrap();
    engine.refresh().await.unwrap();

    let views = engine.view().await;
    assert!(views.iter().all(|v| v.column.title != "Review"));
    let to_do = column_by_title(&views, "To Do");
    assert_eq!(to_do.tasks.len(), 1);
    assert_eq!(to_do.tasks[0].title, "Write spec");

    let loaded = engine.tasks().load().await.unwrap();
    assert_eq!(loaded[0].status, to_do.column.id);
}

#[tokio::test]
async fn checklist_toggle_flips_exactly_one_item() {
    let engine = open_board().await;
    let mut task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();

    task.checklist = vec![ChecklistItem::new("outline"), ChecklistItem::new("review")];
    engine.tasks().update(&task).await.unwrap();
    let outline = task.checklist[0].id.clone();

    let toggled = engine
        .tasks()
        .toggle_checklist(&task.id, &outline)
        .await
        .unwrap();
    assert!(toggled.checklist[0].completed);
    assert!(!toggled.checklist[1].completed);

    // Toggling twice restores the original value.
    let toggled = engine
        .tasks()
        .toggle_checklist(&task.id, &outline)
        .await
        .unwrap();
    assert!(!toggled.checklist[0].completed);
    assert!(!toggled.checklist[1].completed);
}

#[tokio::test]
async fn task_update_cannot_relocate_a_task() {
    let engine = open_board().await;
    let review = engine.columns().add("Review").await.unwrap();
    let mut task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();

    // A stale edit carries an old status; the merge must not apply it.
    engine.tasks().move_to(&task.id, &review.id).await.unwrap();
    task.title = "Write the spec".to_string();
    engine.tasks().update(&task).await.unwrap();

    let loaded = engine.tasks().load().await.unwrap();
    assert_eq!(loaded[0].title, "Write the spec");
    assert_eq!(loaded[0].status, review.id);
}

#[tokio::test]
async fn sync_loop_applies_remote_changes_without_refresh() {
    let engine = open_board().await;
    engine.clone().spawn_sync().await.unwrap();

    engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let views = engine.view().await;
    assert_eq!(column_by_title(&views, "To Do").tasks.len(), 1);
    engine.close().await;
}

#[tokio::test]
async fn task_update_clears_optional_fields() {
    let engine = open_board().await;
    let mut task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            assigned_to: Some("Avery".to_string()),
            start_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()),
            ..TaskDraft::default()
        })
        .await
        .unwrap();

    // Unassigning and clearing the date must survive the merge; an
    // omitted key would leave the stale values in place.
    task.assigned_to = None;
    task.start_date = None;
    engine.tasks().update(&task).await.unwrap();

    let loaded = engine.tasks().load().await.unwrap();
    assert_eq!(loaded[0].assigned_to, None);
    assert_eq!(loaded[0].start_date, None);
}

#[tokio::test]
async fn deleting_personnel_does_not_cascade_to_assignments() {
    let engine = open_board().await;
    let avery = engine.personnel().add("Avery").await.unwrap();
    let mut task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    task.assigned_to = Some(avery.name.clone());
    engine.tasks().update(&task).await.unwrap();

    engine.personnel().delete(&avery.id).await.unwrap();
    engine.refresh().await.unwrap();

    assert!(engine.roster().await.is_empty());
    // The by-name reference stays; consumers render it as unknown.
    let loaded = engine.tasks().load().await.unwrap();
    assert_eq!(loaded[0].assigned_to.as_deref(), Some("Avery"));

    assert!(matches!(
        engine.personnel().add("  ").await,
        Err(BoardError::Validation(_))
    ));
}

/// Store double whose merges always fail, standing in for a network
/// outage on the move write path.
struct MergeOutage {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for MergeOutage {
    async fn read(&self, path: &str, order_by: Option<&str>) -> Result<Snapshot> {
        self.inner.read(path, order_by).await
    }

    async fn subscribe(&self, path: &str, order_by: Option<&str>) -> Result<Subscription> {
        self.inner.subscribe(path, order_by).await
    }

    async fn create(&self, path: &str, fields: Value) -> Result<String> {
        self.inner.create(path, fields).await
    }

    async fn merge(&self, _path: &str, _id: &str, _patch: Value) -> Result<()> {
        Err(BoardError::RemoteWrite("simulated outage".to_string()))
    }

    async fn delete(&self, path: &str, id: &str) -> Result<()> {
        self.inner.delete(path, id).await
    }

    async fn write_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        self.inner.write_batch(ops).await
    }
}

#[tokio::test]
async fn failed_move_keeps_optimistic_placement() {
    let ctx = BoardContext::new(
        Arc::new(MergeOutage {
            inner: MemoryStore::new(),
        }),
        Arc::new(LocalIdentity::with_user("u1")),
        "corkboard",
    );
    let engine = Arc::new(BoardEngine::open(ctx).await.unwrap());

    let review = engine.columns().add("Review").await.unwrap();
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            ..TaskDraft::default()
        })
        .await
        .unwrap();
    engine.refresh().await.unwrap();

    engine.begin_drag(&task.id).await.unwrap();
    let err = engine.drop_on(&review.id).await.unwrap_err();
    assert!(matches!(err, BoardError::RemoteWrite(_)));

    // The optimistic placement survives the failure; only the next
    // authoritative snapshot may correct it.
    let views = engine.view().await;
    assert_eq!(column_by_title(&views, "Review").tasks.len(), 1);
    assert!(column_by_title(&views, "To Do").tasks.is_empty());

    // The engine keeps working after the failure.
    engine.begin_drag(&task.id).await.unwrap();
    engine.cancel_drag().await.unwrap();
}
