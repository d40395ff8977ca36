use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why a client action was refused by the lobby.
///
/// Only join failures are reported back to the client; every other variant
/// is logged at debug level and dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid request: {0}")]
    Invalid(&'static str),
    #[error("not allowed: {0}")]
    Unauthorized(&'static str),
    #[error("Room not found.")]
    RoomNotFound,
    #[error("Game already in progress.")]
    GameInProgress,
    #[error("wrong phase: {0}")]
    StateConflict(&'static str),
}

impl GameError {
    /// Message shown to a player whose join was refused.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(what) => format!("Invalid {what}."),
            other => other.to_string(),
        }
    }
}

/// Error returned by the HTTP gallery endpoints.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Internal(m) => write!(f, "{m}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_errors_have_user_messages() {
        assert_eq!(GameError::RoomNotFound.user_message(), "Room not found.");
        assert_eq!(
            GameError::GameInProgress.user_message(),
            "Game already in progress."
        );
        assert_eq!(
            GameError::Invalid("room code").user_message(),
            "Invalid room code."
        );
    }

    #[test]
    fn app_error_status_codes() {
        let resp = AppError::NotFound("missing".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = AppError::BadRequest("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
