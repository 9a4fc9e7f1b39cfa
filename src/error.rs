use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("boardSize must be at least 2 (got {0})")]
    BoardSize(i32),
    #[error("lobbyWaitingTime must be positive")]
    LobbyWaitingTime,
    #[error("gamePlayTime must be positive")]
    GamePlayTime,
    #[error("maxParticipants must be between 2 and {cells} (got {got})")]
    MaxParticipants { got: usize, cells: usize },
    #[error("characterCount must be positive")]
    CharacterCount,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reasons a join is refused. Only surfaced to the host, which decides
/// whether to route the connection elsewhere or report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("game already started")]
    NotWaiting,
    #[error("room is full")]
    RoomFull,
    #[error("participant id already in use")]
    DuplicateId,
    #[error("unknown character {0}")]
    UnknownCharacter(u32),
    #[error("no room available")]
    Unavailable,
}
