//! Error types shared by the Firebase Realtime Database storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`FirebaseDaoError`] failures.
pub type FirebaseResult<T> = Result<T, FirebaseDaoError>;

/// Failures that can occur while talking to the Realtime Database REST API.
#[derive(Debug, Error)]
pub enum FirebaseDaoError {
    /// Required environment variable is missing.
    #[error("missing Firebase environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Firebase client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request to a database path could not be sent.
    #[error("failed to send Firebase request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The database answered with an unexpected status code.
    #[error("unexpected Firebase response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode Firebase response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}
