//! Process-local store keeping the whole tree as a JSON value.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use super::{DataStore, Snapshot, StorePath, Subscription};
use crate::dao::storage::StorageResult;

/// In-memory [`DataStore`], used for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tree: RwLock<Value>,
    listeners: DashMap<u64, Listener>,
    next_listener: AtomicU64,
}

struct Listener {
    path: StorePath,
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl MemoryInner {
    async fn write(&self, path: &StorePath, value: Value) {
        let mut tree = self.tree.write().await;
        set_at(&mut tree, path.segments(), value);

        // Notify while the tree is still locked so every listener sees writes in order.
        let mut closed = Vec::new();
        for entry in self.listeners.iter() {
            let listener = entry.value();
            if !listener.path.overlaps(path) {
                continue;
            }
            let snapshot = lookup(&tree, listener.path.segments()).cloned();
            if listener.tx.send(snapshot).is_err() {
                closed.push(*entry.key());
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
    }

    async fn read(&self, path: &StorePath) -> Option<Value> {
        let tree = self.tree.read().await;
        lookup(&tree, path.segments()).cloned()
    }

    async fn subscribe(self: &Arc<Self>, path: StorePath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);

        {
            let tree = self.tree.read().await;
            let _ = tx.send(lookup(&tree, path.segments()).cloned());
            debug!(%path, id, "registered memory store listener");
            self.listeners.insert(id, Listener { path, tx });
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        Subscription::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(&id);
            }
        })
    }
}

impl DataStore for MemoryStore {
    fn write(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write(&path, value).await;
            Ok(())
        })
    }

    fn read(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read(&path).await) })
    }

    fn subscribe(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Subscription>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.subscribe(path).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

fn lookup<'a>(tree: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = tree;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

fn set_at(tree: &mut Value, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        *tree = value;
        return;
    };

    let mut current = tree;
    for segment in parents {
        if value.is_null() && current.get(segment).is_none() {
            // Removing below a missing branch is a no-op.
            return;
        }
        current = ensure_object(current)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = ensure_object(current);
    if value.is_null() {
        map.shift_remove(leaf);
    } else {
        map.insert(leaf.clone(), value);
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn write_creates_intermediate_levels() {
        let store = MemoryStore::new();
        store
            .write(path("sessions/AB/members/m1"), json!({ "nickname": "Ana", "streak": 0 }))
            .await
            .unwrap();

        let members = store.read(path("sessions/AB/members")).await.unwrap();
        assert_eq!(members, Some(json!({ "m1": { "nickname": "Ana", "streak": 0 } })));
    }

    #[tokio::test]
    async fn read_missing_segment_is_none() {
        let store = MemoryStore::new();
        store.write(path("sessions/AB"), json!({ "members": {} })).await.unwrap();

        assert_eq!(store.read(path("sessions/CD")).await.unwrap(), None);
        assert_eq!(store.read(path("sessions/AB/scores/m1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_maps_and_zero_values_are_readable() {
        let store = MemoryStore::new();
        store
            .write(path("sessions/AB"), json!({ "members": {}, "scores": {} }))
            .await
            .unwrap();
        store.write(path("sessions/AB/streak"), json!(0)).await.unwrap();

        assert_eq!(store.read(path("sessions/AB/members")).await.unwrap(), Some(json!({})));
        assert_eq!(store.read(path("sessions/AB/streak")).await.unwrap(), Some(json!(0)));
    }

    #[tokio::test]
    async fn writing_null_removes_value() {
        let store = MemoryStore::new();
        store.write(path("a/b"), json!(1)).await.unwrap();
        store.write(path("a/b"), Value::Null).await.unwrap();
        store.write(path("x/y/z"), Value::Null).await.unwrap();

        assert_eq!(store.read(path("a/b")).await.unwrap(), None);
        assert_eq!(store.read(path("x")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscription_receives_current_value_then_related_writes() {
        let store = MemoryStore::new();
        store.write(path("sessions/AB"), json!({ "members": {} })).await.unwrap();

        let mut subscription = store.subscribe(path("sessions/AB")).await.unwrap();
        assert_eq!(subscription.next().await, Some(Some(json!({ "members": {} }))));

        // Descendant write.
        store
            .write(path("sessions/AB/members/m1"), json!({ "nickname": "Ana", "streak": 0 }))
            .await
            .unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(snapshot["members"]["m1"]["nickname"], "Ana");

        // Sibling writes are not delivered; the ancestor write is.
        store.write(path("sessions/ABC"), json!({})).await.unwrap();
        store.write(path("sessions"), json!({ "AB": { "members": {} } })).await.unwrap();
        assert_eq!(subscription.next().await, Some(Some(json!({ "members": {} }))));
    }

    #[tokio::test]
    async fn subscription_on_missing_path_starts_with_none() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe(path("sessions/NOPE")).await.unwrap();
        assert_eq!(subscription.next().await, Some(None));
    }

    #[tokio::test]
    async fn unsubscribe_removes_listener() {
        let store = MemoryStore::new();
        let subscription = store.subscribe(path("sessions/AB")).await.unwrap();
        let other = store.subscribe(path("sessions/AB")).await.unwrap();
        assert_eq!(store.listener_count(), 2);

        subscription.unsubscribe();
        assert_eq!(store.listener_count(), 1);

        drop(other);
        store.write(path("sessions/AB"), json!(1)).await.unwrap();
        assert_eq!(store.listener_count(), 0);
    }
}
