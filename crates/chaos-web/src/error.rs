use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chaos_core::error::ChaosError;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            WebError::Conflict { .. } => StatusCode::CONFLICT,
            WebError::Io(_) | WebError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            WebError::BadRequest { message } | WebError::Conflict { message } => message.clone(),
            WebError::Io(_) | WebError::Internal { .. } => "internal server error".to_string(),
        }
    }
}

impl From<ChaosError> for WebError {
    fn from(err: ChaosError) -> Self {
        match err {
            ChaosError::InvalidMode(_) | ChaosError::InvalidDelay(_) => WebError::BadRequest {
                message: err.to_string(),
            },
            ChaosError::AlreadyInChaos { .. } => WebError::Conflict {
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
