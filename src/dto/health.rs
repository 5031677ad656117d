use serde::Serialize;
use utoipa::ToSchema;

/// Overall service health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Whether a store is installed and answered the last ping.
    pub store_reachable: bool,
}

impl HealthResponse {
    /// Build the payload from the outcome of the store ping.
    pub fn from_ping(store_reachable: bool) -> Self {
        let status = if store_reachable {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            store_reachable,
        }
    }
}
