use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    Internal,
    Transport,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            _ => Self::Internal,
        }
    }
}

/// Failure reported by the flow server, or by the transport underneath it.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            format!("server responded with status {status}")
        } else {
            format!("server responded with status {status}: {}", body.trim())
        };
        Self::new(ErrorCode::from_status(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_http_status_codes() {
        assert_eq!(ErrorCode::from_status(409), ErrorCode::Conflict);
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    }

    #[test]
    fn status_message_includes_body_when_present() {
        let err = ApiError::from_status(404, " group not found ");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(
            err.message,
            "server responded with status 404: group not found"
        );
        assert_eq!(
            ApiError::from_status(500, "").message,
            "server responded with status 500"
        );
    }
}
