use serde::Serialize;
use utoipa::ToSchema;

/// Event name carrying a fresh [`DashboardResponse`](crate::dto::dashboard::DashboardResponse).
pub const SESSION_SNAPSHOT_EVENT: &str = "session.snapshot";
/// Event name sent when the followed session does not exist.
pub const SESSION_MISSING_EVENT: &str = "session.missing";
/// Event name carrying a [`SystemStatus`].
pub const SYSTEM_STATUS_EVENT: &str = "system.status";

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Event with an already serialised payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent when the followed session has no record in the store.
pub struct SessionMissing {
    pub session_code: String,
}
