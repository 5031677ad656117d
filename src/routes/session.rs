use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        dashboard::DashboardResponse,
        session::{
            CreateSessionRequest, JoinSessionRequest, MemberResponse, SessionIdentity,
            SubmitScoresRequest, SubmitScoresResponse, TodayScoresResponse,
        },
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling sessions, membership and daily scores.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{code}/members", post(join_session))
        .route("/sessions/{code}/members/{member_id}", get(resume_member))
        .route(
            "/sessions/{code}/members/{member_id}/scores/today",
            get(get_today_scores).put(submit_today_scores),
        )
        .route("/sessions/{code}/dashboard", get(get_dashboard))
}

/// Open a new session and join it as its first member.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created and joined", body = SessionIdentity),
        (status = 400, description = "Invalid nickname"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionIdentity>), AppError> {
    let identity = session_service::create_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Join an existing session.
#[utoipa::path(
    post,
    path = "/sessions/{code}/members",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code, case insensitive")),
    request_body = JoinSessionRequest,
    responses(
        (status = 201, description = "Session joined", body = SessionIdentity),
        (status = 400, description = "Invalid code, nickname or member id"),
        (status = 404, description = "No session uses this code")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinSessionRequest>>,
) -> Result<(StatusCode, Json<SessionIdentity>), AppError> {
    let identity = session_service::join_session(&state, &code, payload).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Resume a persisted identity.
#[utoipa::path(
    get,
    path = "/sessions/{code}/members/{member_id}",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "Session code"),
        ("member_id" = String, Path, description = "Member identifier")
    ),
    responses(
        (status = 200, description = "Member found", body = MemberResponse),
        (status = 404, description = "Session or member not found")
    )
)]
pub async fn resume_member(
    State(state): State<SharedState>,
    Path((code, member_id)): Path<(String, String)>,
) -> Result<Json<MemberResponse>, AppError> {
    Ok(Json(
        session_service::resume(&state, &code, &member_id).await?,
    ))
}

/// Read what a member logged today.
#[utoipa::path(
    get,
    path = "/sessions/{code}/members/{member_id}/scores/today",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "Session code"),
        ("member_id" = String, Path, description = "Member identifier")
    ),
    responses(
        (status = 200, description = "Today's record, empty when nothing was logged", body = TodayScoresResponse)
    )
)]
pub async fn get_today_scores(
    State(state): State<SharedState>,
    Path((code, member_id)): Path<(String, String)>,
) -> Result<Json<TodayScoresResponse>, AppError> {
    Ok(Json(
        session_service::today_scores(&state, &code, &member_id).await?,
    ))
}

/// Replace today's record of a member.
#[utoipa::path(
    put,
    path = "/sessions/{code}/members/{member_id}/scores/today",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "Session code"),
        ("member_id" = String, Path, description = "Member identifier")
    ),
    request_body = SubmitScoresRequest,
    responses(
        (status = 200, description = "Record stored and streak refreshed", body = SubmitScoresResponse),
        (status = 400, description = "Unknown subject or note too long"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn submit_today_scores(
    State(state): State<SharedState>,
    Path((code, member_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<SubmitScoresRequest>>,
) -> Result<Json<SubmitScoresResponse>, AppError> {
    Ok(Json(
        session_service::submit_scores(&state, &code, &member_id, payload).await?,
    ))
}

/// Dashboard of a session for the current day.
#[utoipa::path(
    get,
    path = "/sessions/{code}/dashboard",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardResponse),
        (status = 404, description = "No session uses this code")
    )
)]
pub async fn get_dashboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(session_service::dashboard(&state, &code).await?))
}
