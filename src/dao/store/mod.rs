#[cfg(feature = "firebase-store")]
pub mod firebase;
pub mod memory;
mod path;
mod subscription;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

pub use self::memory::MemoryStore;
pub use self::path::{InvalidPath, StorePath};
pub use self::subscription::{Snapshot, Subscription};

/// Hierarchical key-path store with point writes, point reads and path-scoped subscriptions.
///
/// Each write is atomic at its own path; nothing spans several paths.
pub trait DataStore: Send + Sync {
    /// Persist `value` at `path`, creating intermediate levels. Writing `null` removes the value.
    fn write(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Value stored at `path`, or `None` when any segment on the way is missing.
    fn read(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Observe `path`: the current value first, then one snapshot per write to
    /// the path, one of its ancestors, or one of its descendants.
    fn subscribe(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Subscription>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
