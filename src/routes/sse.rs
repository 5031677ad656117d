use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sessions/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Dashboard updates (`session.snapshot`, `session.missing`, `system.status`)", content_type = "text/event-stream", body = String),
        (status = 503, description = "Store unavailable")
    )
)]
/// Stream a fresh dashboard every time the session changes.
pub async fn session_events(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::session_stream(&state, &code).await?)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions/{code}/events", get(session_events))
}
