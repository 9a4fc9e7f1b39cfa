use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_CHARACTER_COUNT, DEFAULT_GAME_PLAY_SECS,
    DEFAULT_LOBBY_WAITING_SECS, DEFAULT_MAX_PARTICIPANTS,
};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub board_size: i32,
    /// Seconds.
    pub lobby_waiting_time: u32,
    /// Seconds.
    pub game_play_time: u32,
    pub max_participants: usize,
    pub character_count: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            lobby_waiting_time: DEFAULT_LOBBY_WAITING_SECS,
            game_play_time: DEFAULT_GAME_PLAY_SECS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            character_count: DEFAULT_CHARACTER_COUNT,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn board_cells(&self) -> usize {
        let side = self.board_size.max(0) as usize;
        side * side
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size < 2 {
            return Err(ConfigError::BoardSize(self.board_size));
        }
        if self.lobby_waiting_time == 0 {
            return Err(ConfigError::LobbyWaitingTime);
        }
        if self.game_play_time == 0 {
            return Err(ConfigError::GamePlayTime);
        }
        // Placement needs one free cell per participant.
        let cells = self.board_cells();
        if self.max_participants < 2 || self.max_participants > cells {
            return Err(ConfigError::MaxParticipants {
                got: self.max_participants,
                cells,
            });
        }
        if self.character_count == 0 {
            return Err(ConfigError::CharacterCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.board_size, 8);
        assert_eq!(config.max_participants, 8);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SessionConfig::from_json_str(r#"{"lobbyWaitingTime":5,"gamePlayTime":60}"#)
            .expect("partial config should parse");
        assert_eq!(config.lobby_waiting_time, 5);
        assert_eq!(config.game_play_time, 60);
        assert_eq!(config.board_size, 8);
    }

    #[test]
    fn non_positive_board_size_is_rejected() {
        let err = SessionConfig::from_json_str(r#"{"boardSize":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::BoardSize(0)));
    }

    #[test]
    fn participants_must_fit_on_board() {
        let config = SessionConfig {
            board_size: 2,
            max_participants: 5,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxParticipants { got: 5, cells: 4 })
        ));
    }

    #[test]
    fn zero_timers_are_rejected() {
        let config = SessionConfig {
            game_play_time: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::GamePlayTime)));

        let config = SessionConfig {
            lobby_waiting_time: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::LobbyWaitingTime)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SessionConfig::from_json_str("{boardSize").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
