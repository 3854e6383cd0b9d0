//! OpenAI-style error envelope and the gateway's error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::backend::UpstreamReply;

pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";
pub const UPSTREAM_ERROR: &str = "upstream_error";

/// Error response matching the public protocol: `{error:{message,type,code}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(
        message: impl Into<String>,
        kind: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                kind: kind.into(),
                code: code.into(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid JSON body.")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Missing API key. Use Authorization: Bearer <key> or set {env_var}.")]
    MissingApiKey { env_var: String },

    /// Request-shape violation reported as 400.
    #[error("{message}")]
    InvalidRequest { code: &'static str, message: String },

    #[error("Model not found.")]
    ModelNotFound,

    /// The backend answered but broke the expected contract.
    #[error("{message}")]
    UpstreamContract {
        status: StatusCode,
        code: &'static str,
        message: String,
    },

    #[error("Failed to reach upstream: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// Non-success backend reply, forwarded verbatim.
    #[error("upstream returned {}", .0.status)]
    Upstream(UpstreamReply),
}

impl GatewayError {
    pub fn invalid_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_image_url(message: impl Into<String>) -> Self {
        Self::invalid_request("invalid_image_url", message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::invalid_request("invalid_input", message)
    }

    /// 502 for a backend reply that violates the expected shape.
    pub fn bad_upstream(code: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamContract {
            status: StatusCode::BAD_GATEWAY,
            code,
            message: message.into(),
        }
    }

    /// Substitute for a bodyless backend failure; echoes the backend status.
    pub fn upstream_no_body(status: StatusCode) -> Self {
        Self::UpstreamContract {
            status,
            code: "upstream_no_body",
            message: format!(
                "Upstream returned {} {}.",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MissingApiKey { .. } => StatusCode::UNAUTHORIZED,
            Self::ModelNotFound => StatusCode::NOT_FOUND,
            Self::UpstreamContract { status, .. } => *status,
            Self::Unavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Upstream(reply) => reply.status,
        }
    }

    fn envelope(&self) -> ErrorResponse {
        let (kind, code) = match self {
            Self::InvalidJson(_) => (INVALID_REQUEST_ERROR, "invalid_json"),
            Self::MissingApiKey { .. } => (INVALID_REQUEST_ERROR, "missing_api_key"),
            Self::InvalidRequest { code, .. } => (INVALID_REQUEST_ERROR, *code),
            Self::ModelNotFound => (INVALID_REQUEST_ERROR, "model_not_found"),
            Self::UpstreamContract { code, .. } => (UPSTREAM_ERROR, *code),
            Self::Unavailable(_) | Self::Upstream(_) => (UPSTREAM_ERROR, "upstream_unavailable"),
        };
        ErrorResponse::new(self.to_string(), kind, code)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let Self::Upstream(reply) = self {
            return reply.into_response();
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}
