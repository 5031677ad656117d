/// Dashboard projection of a session.
pub mod dashboard;
/// Health check payloads.
pub mod health;
/// Session, membership and score payloads.
pub mod session;
/// Server-sent event payloads.
pub mod sse;
/// Field validators shared by request payloads.
pub mod validation;
