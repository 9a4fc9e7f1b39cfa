use serde_json::{json, Value};

use crate::types::{Direction, Snapshot};

#[derive(Debug, PartialEq, Eq)]
pub enum ParsedClientMessage {
    Join { name: String, character_id: u32 },
    Move { direction: Direction },
    Leave,
}

/// `None` for anything malformed; callers drop those silently.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "join" => {
            let name = match object.get("name") {
                None => String::new(),
                Some(value) => value.as_str()?.to_string(),
            };
            let character_id = match object.get("characterId") {
                None => 0,
                Some(value) => u32::try_from(value.as_u64()?).ok()?,
            };
            Some(ParsedClientMessage::Join { name, character_id })
        }
        "move" => {
            let direction = Direction::parse_move(object.get("direction")?.as_str()?)?;
            Some(ParsedClientMessage::Move { direction })
        }
        "leave" => Some(ParsedClientMessage::Leave),
        _ => None,
    }
}

pub fn welcome_message(player_id: &str, room_id: &str, snapshot: &Snapshot) -> Value {
    json!({
        "type": "welcome",
        "playerId": player_id,
        "roomId": room_id,
        "state": snapshot,
    })
}

pub fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "state": snapshot,
    })
}

pub fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}
