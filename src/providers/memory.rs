use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::error::Result;
use crate::interfaces::identity::IdentityProvider;
use crate::interfaces::store::{Document, DocumentStore, Snapshot, Subscription, WriteOp};

struct Watcher {
    order_by: Option<String>,
    tx: watch::Sender<Snapshot>,
}

#[derive(Default)]
struct Inner {
    /// Collection path -> documents in insertion order.
    collections: HashMap<String, Vec<Document>>,
    watchers: HashMap<String, Vec<Watcher>>,
}

/// In-memory [`DocumentStore`]: the local fallback backend, and the
/// backend every test runs against. Collections keep insertion order;
/// subscribers get the full snapshot on every change.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str, order_by: Option<&str>) -> Result<Snapshot> {
        let inner = self.inner.lock().await;
        let docs = inner.collections.get(path).cloned().unwrap_or_default();
        Ok(ordered(docs, order_by))
    }

    async fn subscribe(&self, path: &str, order_by: Option<&str>) -> Result<Subscription> {
        let mut inner = self.inner.lock().await;
        let docs = inner.collections.get(path).cloned().unwrap_or_default();
        let (tx, rx) = watch::channel(ordered(docs, order_by));
        inner.watchers.entry(path.to_string()).or_default().push(Watcher {
            order_by: order_by.map(|k| k.to_string()),
            tx,
        });
        Ok(Subscription::new(rx))
    }

    async fn create(&self, path: &str, fields: Value) -> Result<String> {
        let mut inner = self.inner.lock().await;
        let id = Uuid::new_v4().to_string();
        inner
            .collections
            .entry(path.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        notify(&mut inner, path);
        Ok(id)
    }

    async fn merge(&self, path: &str, id: &str, patch: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        apply_merge(&mut inner, path, id, patch);
        notify(&mut inner, path);
        Ok(())
    }

    async fn delete(&self, path: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(docs) = inner.collections.get_mut(path) {
            docs.retain(|doc| doc.id != id);
        }
        notify(&mut inner, path);
        Ok(())
    }

    async fn write_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut touched: Vec<String> = Vec::new();
        for op in ops {
            let path = match op {
                WriteOp::Create { path, fields } => {
                    let id = Uuid::new_v4().to_string();
                    inner
                        .collections
                        .entry(path.clone())
                        .or_default()
                        .push(Document { id, fields });
                    path
                }
                WriteOp::Merge { path, id, patch } => {
                    apply_merge(&mut inner, &path, &id, patch);
                    path
                }
                WriteOp::Delete { path, id } => {
                    if let Some(docs) = inner.collections.get_mut(&path) {
                        docs.retain(|doc| doc.id != id);
                    }
                    path
                }
            };
            if !touched.contains(&path) {
                touched.push(path);
            }
        }
        for path in touched {
            notify(&mut inner, &path);
        }
        Ok(())
    }
}

fn apply_merge(inner: &mut Inner, path: &str, id: &str, patch: Value) {
    let docs = inner.collections.entry(path.to_string()).or_default();
    match docs.iter_mut().find(|doc| doc.id == id) {
        Some(doc) => match (doc.fields.as_object_mut(), patch) {
            (Some(fields), Value::Object(patch)) => {
                for (key, value) in patch {
                    fields.insert(key, value);
                }
            }
            // Non-object documents are replaced wholesale.
            (_, patch) => doc.fields = patch,
        },
        // Upsert: merging into an absent document creates it.
        None => docs.push(Document {
            id: id.to_string(),
            fields: patch,
        }),
    }
}

fn notify(inner: &mut Inner, path: &str) {
    let docs = inner.collections.get(path).cloned().unwrap_or_default();
    if let Some(watchers) = inner.watchers.get_mut(path) {
        watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in watchers.iter() {
            let _ = watcher
                .tx
                .send(ordered(docs.clone(), watcher.order_by.as_deref()));
        }
    }
}

fn ordered(mut docs: Vec<Document>, order_by: Option<&str>) -> Snapshot {
    if let Some(key) = order_by {
        docs.sort_by(|a, b| {
            cmp_values(
                a.fields.get(key).unwrap_or(&Value::Null),
                b.fields.get(key).unwrap_or(&Value::Null),
            )
        });
    }
    docs
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Identity fallback for running without a configured auth backend:
/// a locally generated id, resolved immediately.
pub struct LocalIdentity {
    tx: watch::Sender<Option<String>>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::with_user(format!("local-{}", Uuid::new_v4()))
    }

    pub fn with_user(user: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(Some(user.into()));
        Self { tx }
    }

    /// Starts unresolved; board operations fail with `Auth` until
    /// [`LocalIdentity::sign_in`] runs.
    pub fn signed_out() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, user: impl Into<String>) {
        let _ = self.tx.send(Some(user.into()));
    }

    pub fn sign_out(&self) {
        let _ = self.tx.send(None);
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}
