use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use time::Date;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    clock::date_key,
    dao::{
        models::SessionEntity,
        session::{SessionFeed, SessionRepository},
    },
    dto::{
        dashboard::DashboardResponse,
        sse::{
            SESSION_MISSING_EVENT, SESSION_SNAPSHOT_EVENT, SYSTEM_STATUS_EVENT, ServerEvent,
            SessionMissing, SystemStatus,
        },
    },
    error::ServiceError,
    services::session_service::parse_session_code,
    standings::standings,
    state::SharedState,
};

const FORWARD_BUFFER: usize = 8;

/// Follow a session and stream a fresh dashboard every time it changes.
///
/// The first events are the current `system.status` and the current dashboard
/// (or `session.missing`). `system.status` is repeated whenever degraded mode flips.
pub async fn session_stream(
    state: &SharedState,
    raw_code: &str,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let code = parse_session_code(raw_code)?;
    let repository = state.repository().await?;
    let status = state.status_hub().subscribe();
    let feed = repository.listen_to_session(&code).await?;

    let initial = match ServerEvent::json(
        Some(SYSTEM_STATUS_EVENT.to_string()),
        &SystemStatus {
            degraded: state.is_degraded(),
        },
    ) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(%code, error = %err, "failed to serialise system status");
            None
        }
    };

    info!(%code, "session stream connected");
    let receiver = spawn_forwarder(code, repository, feed, status, initial);
    Ok(to_sse(receiver))
}

/// Forward session snapshots and status broadcasts into a bounded channel.
///
/// The task ends, and the store subscription is released, once the receiving
/// side is dropped or the feed ends.
fn spawn_forwarder(
    code: String,
    repository: SessionRepository,
    mut feed: SessionFeed,
    mut status: broadcast::Receiver<ServerEvent>,
    initial: Option<ServerEvent>,
) -> mpsc::Receiver<ServerEvent> {
    let (tx, rx) = mpsc::channel::<ServerEvent>(FORWARD_BUFFER);

    tokio::spawn(async move {
        if let Some(event) = initial {
            if tx.send(event).await.is_err() {
                feed.unsubscribe();
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                snapshot = feed.next() => {
                    let Some(session) = snapshot else {
                        break;
                    };
                    let event = match session_event(&code, session, repository.today()) {
                        Ok(event) => event,
                        Err(err) => {
                            warn!(%code, error = %err, "failed to serialise session event");
                            continue;
                        }
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                recv_result = status.recv() => {
                    match recv_result {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        feed.unsubscribe();
        info!(%code, "session stream disconnected");
    });

    rx
}

/// Event for one session snapshot: the dashboard, or `session.missing`.
fn session_event(
    code: &str,
    session: Option<SessionEntity>,
    today: Date,
) -> serde_json::Result<ServerEvent> {
    match session {
        Some(session) => ServerEvent::json(
            Some(SESSION_SNAPSHOT_EVENT.to_string()),
            &DashboardResponse::new(code.to_owned(), date_key(today), standings(&session, today)),
        ),
        None => ServerEvent::json(
            Some(SESSION_MISSING_EVENT.to_string()),
            &SessionMissing {
                session_code: code.to_owned(),
            },
        ),
    }
}

fn to_sse(
    receiver: mpsc::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(receiver).map(|payload| {
        let mut event = Event::default().data(payload.data);
        if let Some(name) = payload.event {
            event = event.event(name);
        }
        Ok(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use serde_json::Value;
    use time::macros::date;

    use super::*;
    use crate::{
        clock::FixedClock,
        dao::store::MemoryStore,
    };

    fn repository(store: Arc<MemoryStore>) -> SessionRepository {
        SessionRepository::new(store, Arc::new(FixedClock(date!(2024 - 05 - 15))))
    }

    fn status_event() -> Option<ServerEvent> {
        Some(ServerEvent::new(
            Some(SYSTEM_STATUS_EVENT.into()),
            r#"{"degraded":false}"#.into(),
        ))
    }

    fn data(event: &ServerEvent) -> Value {
        serde_json::from_str(&event.data).unwrap()
    }

    #[tokio::test]
    async fn forwards_status_then_snapshots() {
        let store = Arc::new(MemoryStore::new());
        let repository = repository(store.clone());
        let code = repository.create_session().await.unwrap();
        repository.join_session(&code, "m1", "Rafi").await.unwrap();

        let (_status_tx, status_rx) = broadcast::channel(4);
        let feed = repository.listen_to_session(&code).await.unwrap();
        let mut rx = spawn_forwarder(
            code.clone(),
            repository.clone(),
            feed,
            status_rx,
            status_event(),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some(SYSTEM_STATUS_EVENT));

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.event.as_deref(), Some(SESSION_SNAPSHOT_EVENT));
        assert_eq!(data(&snapshot)["members"][0]["nickname"], "Rafi");

        let mut scores = IndexMap::new();
        scores.insert("math".to_string(), 9);
        repository
            .submit_scores(&code, "m1", &scores, &IndexMap::new())
            .await
            .unwrap();

        let mut latest = rx.recv().await.unwrap();
        while data(&latest)["champion"].is_null() || data(&latest)["members"][0]["streak"] != 1 {
            latest = rx.recv().await.unwrap();
        }
        assert_eq!(data(&latest)["champion"]["score"], 9);
    }

    #[tokio::test]
    async fn missing_session_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let repository = repository(store);
        let (_status_tx, status_rx) = broadcast::channel(4);
        let feed = repository.listen_to_session("ZZZZZZ").await.unwrap();

        let mut rx = spawn_forwarder("ZZZZZZ".into(), repository, feed, status_rx, status_event());
        rx.recv().await.unwrap();

        let missing = rx.recv().await.unwrap();
        assert_eq!(missing.event.as_deref(), Some(SESSION_MISSING_EVENT));
        assert_eq!(data(&missing)["session_code"], "ZZZZZZ");
    }

    #[tokio::test]
    async fn status_broadcasts_are_forwarded() {
        let store = Arc::new(MemoryStore::new());
        let repository = repository(store);
        let (status_tx, status_rx) = broadcast::channel(4);
        let feed = repository.listen_to_session("ZZZZZZ").await.unwrap();

        let mut rx = spawn_forwarder("ZZZZZZ".into(), repository, feed, status_rx, status_event());
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        status_tx
            .send(ServerEvent::new(
                Some(SYSTEM_STATUS_EVENT.into()),
                r#"{"degraded":true}"#.into(),
            ))
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(data(&event)["degraded"], true);
    }

    #[tokio::test]
    async fn dropping_the_receiver_releases_the_subscription() {
        let store = Arc::new(MemoryStore::new());
        let repository = repository(store.clone());
        let (_status_tx, status_rx) = broadcast::channel(4);
        let feed = repository.listen_to_session("ZZZZZZ").await.unwrap();
        assert_eq!(store.listener_count(), 1);

        let rx = spawn_forwarder("ZZZZZZ".into(), repository, feed, status_rx, status_event());
        drop(rx);

        for _ in 0..50 {
            if store.listener_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn session_event_builds_dashboard() {
        let session = SessionEntity::empty("2024-05-15T08:00:00Z".into());
        let event = session_event("AB12CD", Some(session), date!(2024 - 05 - 15)).unwrap();
        let payload = data(&event);
        assert_eq!(payload["session_code"], "AB12CD");
        assert_eq!(payload["date"], "2024-05-15");
        assert_eq!(payload["weekly_target"], 280);
        assert!(payload["champion"].is_null());
    }
}
