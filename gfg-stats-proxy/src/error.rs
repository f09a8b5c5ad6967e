use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gfg_stats_logic::UsernameError;
use serde::Serialize;
use thiserror::Error;

/// Body of every error the proxy returns
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidUsername(#[from] UsernameError),

    /// Backend answered with a non-success status we pass on
    #[error("{message}")]
    Backend {
        status: StatusCode,
        message: &'static str,
    },

    /// Couldn't reach the backend or make sense of what it sent
    #[error("{0}")]
    Upstream(&'static str),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
            ProxyError::Backend { status, .. } => status,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
