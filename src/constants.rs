use std::time::Duration;

pub const TICK_MS: u64 = 1_000;
pub const TICK: Duration = Duration::from_millis(TICK_MS);

pub const DEFAULT_BOARD_SIZE: i32 = 8;
pub const DEFAULT_LOBBY_WAITING_SECS: u32 = 30;
pub const DEFAULT_GAME_PLAY_SECS: u32 = 180;
pub const DEFAULT_MAX_PARTICIPANTS: usize = 8;
pub const DEFAULT_CHARACTER_COUNT: u32 = 8;

/// Once this many humans wait in the lobby the countdown is cut down to
/// `FAST_START_WAITING_SECS`.
pub const FAST_START_HUMAN_COUNT: usize = 2;
pub const FAST_START_WAITING_SECS: u32 = 10;

/// Manhattan distance at which an AI runner switches to close-range escape.
pub const EVASION_PROXIMITY: i32 = 2;

pub const TEARDOWN_GRACE_SECS: u32 = 10;

pub const MAX_NAME_CHARS: usize = 16;
pub const CLIENT_QUEUE_CAPACITY: usize = 256;
pub const ROOM_COMMAND_CAPACITY: usize = 256;
