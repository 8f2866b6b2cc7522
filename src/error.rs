use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected before any request was sent to the backend.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with an `error` field.
    #[error("{0}")]
    Backend(String),

    /// Network failure, timeout or an undecodable body. The detail is only
    /// logged, the user sees `message`.
    #[error("{message}: {detail}")]
    Transport { message: String, detail: String },

    #[error("A request is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn transport(message: &str, detail: impl std::fmt::Display) -> Self {
        AppError::Transport {
            message: message.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transport { .. } => StatusCode::BAD_GATEWAY,
            AppError::Busy => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown in the notification banner.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": self.user_message()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_hide_detail_from_user() {
        let err = AppError::transport("Error uploading files", "connection refused");
        assert_eq!(err.user_message(), "Error uploading files");
        assert_eq!(err.to_string(), "Error uploading files: connection refused");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn backend_errors_are_shown_verbatim() {
        let err = AppError::Backend("Only CSV files are allowed".into());
        assert_eq!(err.user_message(), "Only CSV files are allowed");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
