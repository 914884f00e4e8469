use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use thiserror::Error;

/// Failures talking to the habit backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("session expired or missing")]
    Auth,

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A week move that would leave the calendar's representable range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move {weeks} weeks from {anchor}")]
pub struct NavigationError {
    pub anchor: NaiveDate,
    pub weeks: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn login_required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "login required".into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<NavigationError> for AppError {
    fn from(err: NavigationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let status = match &err {
            ClientError::Auth => return Self::login_required(),
            ClientError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClientError::NotFound(_) => StatusCode::NOT_FOUND,
            ClientError::Transport(_) | ClientError::Server { .. } | ClientError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::UNAUTHORIZED {
            return Redirect::to("/login").into_response();
        }
        (self.status, self.message).into_response()
    }
}
