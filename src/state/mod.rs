mod sse;

use std::sync::Arc;

use time::Date;
use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::{
    clock::Clock,
    config::WebClientConfig,
    dao::{session::SessionRepository, store::DataStore},
    dto::sse::{SYSTEM_STATUS_EVENT, ServerEvent, SystemStatus},
    error::ServiceError,
};

pub use self::sse::SseHub;

/// Shared handle passed to every axum handler.
pub type SharedState = Arc<AppState>;

const STATUS_HUB_CAPACITY: usize = 16;

/// Central application state holding the store handle and connectivity flags.
pub struct AppState {
    store: RwLock<Option<Arc<dyn DataStore>>>,
    clock: Arc<dyn Clock>,
    degraded: watch::Sender<bool>,
    status: SseHub,
    client_config: Option<WebClientConfig>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(clock: Arc<dyn Clock>, client_config: Option<WebClientConfig>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            clock,
            degraded: degraded_tx,
            status: SseHub::new(STATUS_HUB_CAPACITY),
            client_config,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DataStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn DataStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Repository bound to the current store and clock.
    pub async fn repository(&self) -> Result<SessionRepository, ServiceError> {
        let store = self.require_store().await?;
        Ok(SessionRepository::new(store, self.clock.clone()))
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn DataStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Hub carrying `system.status` events to every open session stream.
    pub fn status_hub(&self) -> &SseHub {
        &self.status
    }

    /// Today's date according to the configured clock.
    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// Web client parameters served to the frontend, when a remote store is configured.
    pub fn client_config(&self) -> Option<&WebClientConfig> {
        self.client_config.as_ref()
    }

    /// Update the degraded flag and announce the change to stream subscribers.
    pub(crate) fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if !changed {
            return;
        }

        match ServerEvent::json(
            Some(SYSTEM_STATUS_EVENT.to_string()),
            &SystemStatus { degraded: value },
        ) {
            Ok(event) => self.status.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise system status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, dao::store::MemoryStore};
    use time::macros::date;

    fn state() -> SharedState {
        AppState::new(Arc::new(FixedClock(date!(2024 - 05 - 15))), None)
    }

    #[tokio::test]
    async fn starts_degraded_without_store() {
        let state = state();
        assert!(state.is_degraded());
        assert!(matches!(
            state.repository().await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn installing_a_store_leaves_degraded_mode() {
        let state = state();
        let mut watcher = state.degraded_watcher();
        let mut status = state.status_hub().subscribe();

        state.install_store(Arc::new(MemoryStore::new())).await;

        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        let event = status.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(SYSTEM_STATUS_EVENT));
        assert_eq!(event.data, r#"{"degraded":false}"#);
        assert!(state.repository().await.is_ok());
    }

    #[tokio::test]
    async fn repeated_flags_are_not_broadcast() {
        let state = state();
        let mut status = state.status_hub().subscribe();

        state.update_degraded(true);
        assert!(status.try_recv().is_err());

        state.install_store(Arc::new(MemoryStore::new())).await;
        state.clear_store().await;
        assert!(state.is_degraded());
        assert_eq!(status.try_recv().unwrap().data, r#"{"degraded":false}"#);
        assert_eq!(status.try_recv().unwrap().data, r#"{"degraded":true}"#);
    }

    #[test]
    fn today_follows_the_clock() {
        assert_eq!(state().today(), date!(2024 - 05 - 15));
    }
}
