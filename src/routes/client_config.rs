use axum::{Json, Router, extract::State, routing::get};

use crate::{config::WebClientConfig, error::AppError, state::SharedState};

#[utoipa::path(
    get,
    path = "/client-config",
    tag = "health",
    responses(
        (status = 200, description = "Web SDK parameters of the hosted store", body = WebClientConfig),
        (status = 404, description = "Running on the in-memory store")
    )
)]
/// Parameters a browser client needs to initialise its own store SDK.
pub async fn client_config(
    State(state): State<SharedState>,
) -> Result<Json<WebClientConfig>, AppError> {
    state
        .client_config()
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no hosted store configured".into()))
}

/// Configure the client bootstrap route.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/client-config", get(client_config))
}
