/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Session creation, membership and score operations.
pub mod session_service;
/// Server-Sent Events streaming of session dashboards.
pub mod sse_service;
/// Store connection supervisor toggling degraded mode.
pub mod storage_supervisor;
