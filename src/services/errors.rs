use crate::repositories::queue_repository::QueueRepositoryError;
use crate::repositories::room_repository::RoomRepositoryError;

#[derive(Debug)]
pub enum MatchmakingServiceError {
    RepositoryError(String),
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<QueueRepositoryError> for MatchmakingServiceError {
    fn from(error: QueueRepositoryError) -> Self {
        MatchmakingServiceError::RepositoryError(error.to_string())
    }
}

#[derive(Debug)]
pub enum RoomServiceError {
    RepositoryError(String),
}

impl std::fmt::Display for RoomServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for RoomServiceError {}

impl From<RoomRepositoryError> for RoomServiceError {
    fn from(error: RoomRepositoryError) -> Self {
        RoomServiceError::RepositoryError(error.to_string())
    }
}

impl From<RoomServiceError> for MatchmakingServiceError {
    fn from(error: RoomServiceError) -> Self {
        MatchmakingServiceError::RepositoryError(error.to_string())
    }
}

#[derive(Debug)]
pub enum CoordinatorError {
    /// Entering matchmaking failed outright (store unreachable). The one
    /// failure that is surfaced to the player, with a path back to retry.
    Matchmaking(String),
    /// The operation needs a session attached to a room.
    NotAnOnlineRound,
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatorError::Matchmaking(msg) => write!(f, "Matchmaking error: {}", msg),
            CoordinatorError::NotAnOnlineRound => {
                write!(f, "Round is not attached to an online room")
            }
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<MatchmakingServiceError> for CoordinatorError {
    fn from(error: MatchmakingServiceError) -> Self {
        CoordinatorError::Matchmaking(error.to_string())
    }
}
