use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced by HTTP handlers.
///
/// Responses are always plain text. Client errors echo their fixed message;
/// collaborator failures render only their fixed message while the full cause
/// chain goes to the operational log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{message}: {source:#}")]
    Collaborator {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    /// Wraps a collaborator failure behind a fixed, caller-facing message.
    pub fn collaborator<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        AppError::Collaborator {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Collaborator { .. }
            | AppError::ConfigError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::BadRequest(message) => message,
            AppError::Collaborator { message, source } => {
                tracing::error!(error = ?source, "{}", message);
                message
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = ?err, "Configuration error");
                "Configuration error".to_string()
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                "Internal server error".to_string()
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
