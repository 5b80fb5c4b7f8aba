use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Gateway error taxonomy (§7). Retrieval-layer errors that the
/// orchestrator already recovers from (`EmptySeedSet`, `RateLimited`) never
/// reach this type — only errors it surfaces do.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    #[error("group not authorised: {0}")]
    NotAuthorised(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("request timed out")]
    Timeout,

    #[error("algorithm version {0:?} is deprecated")]
    DeprecatedVersion(String),

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] graphrag_retrieval::RetrievalError),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// HTTP status code for this error, per §7's taxonomy table.
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotAuthorised(_) => StatusCode::FORBIDDEN,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServerError::DeprecatedVersion(_) => StatusCode::GONE,
            ServerError::JobNotFound(_) | ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Retrieval(graphrag_retrieval::RetrievalError::Cancelled) => {
                StatusCode::from_u16(499).expect("499 is a valid status code")
            }
            ServerError::Retrieval(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::Unauthenticated(_) => "UNAUTHENTICATED",
            ServerError::NotAuthorised(_) => "NOT_AUTHORISED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::Timeout => "TIMEOUT",
            ServerError::DeprecatedVersion(_) => "DEPRECATED_VERSION",
            ServerError::JobNotFound(_) => "JOB_NOT_FOUND",
            ServerError::Retrieval(_) => "RETRIEVAL_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::InvalidRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

// Display is automatically derived by thiserror::Error
