use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Playing,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    None,
    Players,
    Giant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    AllCaught,
    TimeUp,
    Abandoned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Runner,
    Giant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    Human,
    Ai,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    #[serde(rename = "characterId")]
    pub character_id: u32,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "isGiant")]
    pub is_giant: bool,
    #[serde(rename = "isCaught")]
    pub is_caught: bool,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub connected: bool,
}

/// Published room state, pushed to every client after each mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    #[serde(rename = "boardSize")]
    pub board_size: i32,
    #[serde(rename = "waitingTimer")]
    pub waiting_timer: u32,
    #[serde(rename = "gameTimer")]
    pub game_timer: u32,
    pub winner: Winner,
    #[serde(rename = "endReason")]
    pub end_reason: Option<EndReason>,
    #[serde(rename = "giantId")]
    pub giant_id: Option<String>,
    pub players: Vec<PlayerView>,
}
