use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("catalog contains no tracks")]
    EmptyCatalog,

    #[error("track {id} is invalid: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("invalid score delta {0}, points must not be negative")]
    InvalidPoints(i64),

    #[error("current round has already been guessed")]
    RoundAlreadyGuessed,

    #[error("current round has already been revealed")]
    RoundRevealed,

    #[error("time is up")]
    TimeExpired,

    #[error("session has ended")]
    SessionEnded,

    #[error("session has not ended yet")]
    NotEnded,

    #[error("no catalog loaded")]
    NotStarted,

    #[error("a catalog is already loaded")]
    AlreadyStarted,

    #[error("session is not a timed round")]
    NotTimed,

    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}
