use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::board::columns::{parse_columns, ColumnStore};
use crate::board::context::BoardContext;
use crate::board::personnel::{parse_personnel, PersonnelStore};
use crate::board::projection::{project, ColumnView};
use crate::board::tasks::{parse_tasks, TaskStore};
use crate::drag_fsm::{transition, DragEvent, DragState};
use crate::error::{BoardError, Result};
use crate::interfaces::store::Document;
use crate::model::{Column, Personnel, Task};

#[derive(Debug, Clone)]
struct DragGesture {
    task_id: String,
    source_column: String,
}

struct EngineState {
    columns: Vec<Column>,
    tasks: Vec<Task>,
    personnel: Vec<Personnel>,
    view: Vec<ColumnView>,
    drag: DragState,
    gesture: Option<DragGesture>,
}

impl EngineState {
    fn rebuild_view(&mut self) {
        self.view = project(&self.columns, &self.tasks);
    }
}

/// The write path and local source of truth for one client. Holds the
/// latest snapshots, recomputes the projection on every change, and
/// applies drag moves optimistically before the remote write resolves.
///
/// A failed remote move is reported and logged but never rolled back
/// locally; the next authoritative snapshot reconciles the projection.
pub struct BoardEngine {
    ctx: Arc<BoardContext>,
    column_store: ColumnStore,
    task_store: TaskStore,
    personnel_store: PersonnelStore,
    state: Mutex<EngineState>,
    sync: Mutex<Option<JoinHandle<()>>>,
}

impl BoardEngine {
    /// Waits for a resolved identity, bootstraps the reserved columns,
    /// loads all three collections, and builds the first projection.
    pub async fn open(ctx: Arc<BoardContext>) -> Result<Self> {
        let mut identity = ctx.identity().watch();
        while identity.borrow_and_update().is_none() {
            identity.changed().await.map_err(|_| BoardError::Auth)?;
        }
        let user = ctx.require_user()?;
        info!(user = %user, app = %ctx.app_id(), "opening board");

        let column_store = ColumnStore::new(ctx.clone());
        let task_store = TaskStore::new(ctx.clone());
        let personnel_store = PersonnelStore::new(ctx.clone());

        // Columns first: tasks reference column ids.
        let columns = column_store.ensure_defaults().await?;
        let tasks = task_store.load().await?;
        let personnel = personnel_store.load().await?;

        let mut state = EngineState {
            columns,
            tasks,
            personnel,
            view: Vec::new(),
            drag: DragState::Idle,
            gesture: None,
        };
        state.rebuild_view();

        Ok(Self {
            ctx,
            column_store,
            task_store,
            personnel_store,
            state: Mutex::new(state),
            sync: Mutex::new(None),
        })
    }

    pub fn context(&self) -> &Arc<BoardContext> {
        &self.ctx
    }

    pub fn columns(&self) -> &ColumnStore {
        &self.column_store
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.task_store
    }

    pub fn personnel(&self) -> &PersonnelStore {
        &self.personnel_store
    }

    /// The current projection, cheap to clone and safe to render.
    pub async fn view(&self) -> Vec<ColumnView> {
        self.state.lock().await.view.clone()
    }

    pub async fn roster(&self) -> Vec<Personnel> {
        self.state.lock().await.personnel.clone()
    }

    /// One-shot reload of all three collections plus a projection
    /// rebuild. Used by consumers that mutate through the stores without
    /// running the sync loop.
    pub async fn refresh(&self) -> Result<()> {
        let columns = self.column_store.load().await?;
        let tasks = self.task_store.load().await?;
        let personnel = self.personnel_store.load().await?;
        let mut state = self.state.lock().await;
        state.columns = columns;
        state.tasks = tasks;
        state.personnel = personnel;
        state.rebuild_view();
        Ok(())
    }

    /// Subscribes to all three collections and drives snapshot
    /// application until the subscriptions close or [`BoardEngine::close`]
    /// aborts the loop.
    pub async fn spawn_sync(self: Arc<Self>) -> Result<()> {
        let mut columns_sub = self.column_store.subscribe().await?;
        let mut tasks_sub = self.task_store.subscribe().await?;
        let mut personnel_sub = self.personnel_store.subscribe().await?;

        let engine = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    snapshot = columns_sub.changed() => match snapshot {
                        Some(snapshot) => engine.apply_columns(&snapshot).await,
                        None => break,
                    },
                    snapshot = tasks_sub.changed() => match snapshot {
                        Some(snapshot) => engine.apply_tasks(&snapshot).await,
                        None => break,
                    },
                    snapshot = personnel_sub.changed() => match snapshot {
                        Some(snapshot) => engine.apply_personnel(&snapshot).await,
                        None => break,
                    },
                }
            }
            debug!("board sync loop ended");
        });
        *self.sync.lock().await = Some(handle);
        Ok(())
    }

    /// Ends the sync loop and drops its subscriptions. Idempotent.
    pub async fn close(&self) {
        if let Some(handle) = self.sync.lock().await.take() {
            handle.abort();
            debug!("board sync loop aborted");
        }
    }

    async fn apply_columns(&self, snapshot: &[Document]) {
        let columns = parse_columns(snapshot);
        let mut state = self.state.lock().await;
        debug!(count = columns.len(), "applying column snapshot");
        state.columns = columns;
        state.rebuild_view();
    }

    async fn apply_tasks(&self, snapshot: &[Document]) {
        let tasks = parse_tasks(snapshot);
        let mut state = self.state.lock().await;
        debug!(count = tasks.len(), "applying task snapshot");
        state.tasks = tasks;
        state.rebuild_view();
    }

    async fn apply_personnel(&self, snapshot: &[Document]) {
        let personnel = parse_personnel(snapshot);
        let mut state = self.state.lock().await;
        debug!(count = personnel.len(), "applying personnel snapshot");
        state.personnel = personnel;
    }

    /// Starts a drag gesture on a task currently in the projection.
    pub async fn begin_drag(&self, task_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let source = state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.status.clone())
            .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
        let next = transition(state.drag, DragEvent::Grab)
            .ok_or_else(|| BoardError::Validation("a drag is already in progress".to_string()))?;
        state.drag = next;
        state.gesture = Some(DragGesture {
            task_id: task_id.to_string(),
            source_column: source,
        });
        Ok(())
    }

    /// Discards a drag that ended outside any column target. No store
    /// mutation happens.
    pub async fn cancel_drag(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let next = transition(state.drag, DragEvent::Cancel)
            .ok_or_else(|| BoardError::Validation("no drag in progress".to_string()))?;
        state.drag = next;
        state.gesture = None;
        Ok(())
    }

    /// Completes a drag onto a column. Dropping on the source column is a
    /// no-op. Otherwise the task is spliced into the target column's
    /// projected list immediately and the remote move is issued after;
    /// the optimistic placement stays even if that write fails.
    pub async fn drop_on(&self, column_id: &str) -> Result<()> {
        let gesture = {
            let mut state = self.state.lock().await;
            let next = transition(state.drag, DragEvent::Drop)
                .ok_or_else(|| BoardError::Validation("no drag in progress".to_string()))?;
            state.drag = next;
            let gesture = state.gesture.take();
            state.drag = transition(state.drag, DragEvent::Settle).unwrap_or(DragState::Idle);

            let gesture = gesture
                .ok_or_else(|| BoardError::Validation("no drag in progress".to_string()))?;
            if !state.columns.iter().any(|c| c.id == column_id) {
                return Err(BoardError::NotFound(format!("column {column_id}")));
            }
            if gesture.source_column == column_id {
                debug!(task = %gesture.task_id, "dropped on source column, nothing to do");
                return Ok(());
            }
            if let Some(task) = state.tasks.iter_mut().find(|t| t.id == gesture.task_id) {
                task.status = column_id.to_string();
            }
            state.rebuild_view();
            gesture
        };

        if let Err(err) = self.task_store.move_to(&gesture.task_id, column_id).await {
            warn!(
                task = %gesture.task_id,
                "remote move failed, keeping optimistic placement until the next snapshot: {err}"
            );
            return Err(err);
        }
        Ok(())
    }
}
