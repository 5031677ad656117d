use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the study journal backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::client_config::client_config,
        crate::routes::session::create_session,
        crate::routes::session::join_session,
        crate::routes::session::resume_member,
        crate::routes::session::get_today_scores,
        crate::routes::session::submit_today_scores,
        crate::routes::session::get_dashboard,
        crate::routes::sse::session_events,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::config::WebClientConfig,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::JoinSessionRequest,
            crate::dto::session::SubmitScoresRequest,
            crate::dto::session::SessionIdentity,
            crate::dto::session::MemberResponse,
            crate::dto::session::ScoreEntryDto,
            crate::dto::session::TodayScoresResponse,
            crate::dto::session::SubmitScoresResponse,
            crate::dto::dashboard::DashboardResponse,
            crate::dto::dashboard::ChampionDto,
            crate::dto::dashboard::MemberCardDto,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::SessionMissing,
        )
    ),
    tags(
        (name = "health", description = "Health check and client bootstrap endpoints"),
        (name = "sessions", description = "Sessions, membership and daily scores"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
