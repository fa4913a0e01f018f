use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::Result;

/// A stored record: backend-generated id plus its JSON field object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

/// The full contents of one collection at a point in time.
pub type Snapshot = Vec<Document>;

/// One write in an independent batch. Batch members do not form a
/// transaction; partial failure leaves earlier writes applied.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Create {
        path: String,
        fields: Value,
    },
    Merge {
        path: String,
        id: String,
        patch: Value,
    },
    Delete {
        path: String,
        id: String,
    },
}

/// Cancellable handle to a collection's change feed. Carries the latest
/// full snapshot; intermediate states may be skipped. Dropping the handle
/// (or calling [`Subscription::cancel`]) ends delivery.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    pub fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self { rx }
    }

    /// The most recently delivered snapshot.
    pub fn latest(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Waits for the next change and returns the new snapshot, or `None`
    /// once the publishing store has gone away.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    pub fn cancel(self) {}
}

/// Capability surface the board core needs from a remote document store:
/// ordered collection reads with change notification, merge-upsert,
/// delete, and a batch of independent writes. Per-user isolation is
/// encoded in the collection path, not here.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a whole collection, optionally sorted ascending by one
    /// top-level field.
    async fn read(&self, path: &str, order_by: Option<&str>) -> Result<Snapshot>;

    /// Registers for change pushes on a collection. The returned handle
    /// starts out holding the current snapshot.
    async fn subscribe(&self, path: &str, order_by: Option<&str>) -> Result<Subscription>;

    /// Creates a document and returns its generated id.
    async fn create(&self, path: &str, fields: Value) -> Result<String>;

    /// Shallow field patch with upsert semantics: absent documents are
    /// created from the patch, existing fields not named are kept.
    async fn merge(&self, path: &str, id: &str, patch: Value) -> Result<()>;

    async fn delete(&self, path: &str, id: &str) -> Result<()>;

    /// Applies a batch of independent writes, notifying each touched
    /// collection once after the batch.
    async fn write_batch(&self, ops: Vec<WriteOp>) -> Result<()>;
}
