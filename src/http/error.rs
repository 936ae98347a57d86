use rouille::Response;
use thiserror::Error;

use crate::{game::error::GameError, library::error::LibraryError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::TrackNotFound(id) => ApiError::NotFound(format!("track {} not found", id)),

            LibraryError::InvalidTrackFile { track } => {
                ApiError::NotFound(format!("track {} has no valid files", track))
            }

            LibraryError::InvalidTrackId => ApiError::BadRequest("invalid track id".into()),

            LibraryError::InvalidRecord(e) => ApiError::from(e),

            LibraryError::Metadata(_)
            | LibraryError::Lookup(_)
            | LibraryError::Json(_)
            | LibraryError::Fs(_)
            | LibraryError::Internal(_) => ApiError::Internal("internal server error".into()),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::EmptyCatalog
            | GameError::InvalidRecord { .. }
            | GameError::InvalidPoints(_)
            | GameError::InvalidConfig(_) => ApiError::BadRequest(err.to_string()),

            GameError::RoundAlreadyGuessed
            | GameError::RoundRevealed
            | GameError::TimeExpired
            | GameError::SessionEnded
            | GameError::NotEnded
            | GameError::NotStarted
            | GameError::AlreadyStarted
            | GameError::NotTimed => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<rouille::input::json::JsonError> for ApiError {
    fn from(err: rouille::input::json::JsonError) -> Self {
        ApiError::BadRequest(format!("invalid request body: {err}"))
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        Response::text(self.to_string()).with_status_code(status)
    }
}
