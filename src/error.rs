//! Error taxonomy for room and gameplay requests

/// Result type for session operations
pub type GameResult<T> = Result<T, GameError>;

/// Everything a request against a room can be refused for.
///
/// Rejections happen before any session field is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Someone with that name is already in the room")]
    DuplicateName,

    #[error("Display name must not be empty")]
    InvalidName,

    #[error("Invalid room settings: {0}")]
    InvalidConfig(String),

    #[error("Not enough players: {players} joined, at least {needed} needed")]
    InsufficientPlayers { players: usize, needed: usize },

    #[error("Only the first player to join can start the game")]
    NotModerator,

    #[error("The game has already started")]
    GameInProgress,

    #[error("You are already in a room")]
    AlreadySeated,

    #[error("You are not in this room")]
    NotInRoom,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("That player can't be targeted")]
    InvalidTarget,

    #[error("Not allowed in the current phase")]
    WrongPhase,

    #[error("The game is over")]
    SessionEnded,
}

impl GameError {
    /// Stable machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "ROOM_NOT_FOUND",
            GameError::WrongPassword => "WRONG_PASSWORD",
            GameError::DuplicateName => "DUPLICATE_NAME",
            GameError::InvalidName => "INVALID_NAME",
            GameError::InvalidConfig(_) => "INVALID_CONFIG",
            GameError::InsufficientPlayers { .. } => "INSUFFICIENT_PLAYERS",
            GameError::NotModerator => "NOT_MODERATOR",
            GameError::GameInProgress => "GAME_IN_PROGRESS",
            GameError::AlreadySeated => "ALREADY_SEATED",
            GameError::NotInRoom => "NOT_IN_ROOM",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::InvalidTarget => "INVALID_TARGET",
            GameError::WrongPhase => "WRONG_PHASE",
            GameError::SessionEnded => "SESSION_ENDED",
        }
    }

    /// Late or out-of-turn submissions are dropped without a reply
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            GameError::WrongPhase | GameError::NotYourTurn | GameError::InvalidTarget
        )
    }
}
