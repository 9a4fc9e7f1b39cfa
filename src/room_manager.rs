use std::collections::HashMap;

use rand::Rng;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{error, info};

use crate::config::SessionConfig;
use crate::engine::GameSession;
use crate::error::{ConfigError, JoinError};
use crate::room::{OutboundMessage, RoomCommand, RoomHandle};
use crate::server_utils::make_id;
use crate::types::Snapshot;

pub struct JoinedRoom {
    pub room_id: String,
    pub commands: mpsc::Sender<RoomCommand>,
    pub snapshot: Snapshot,
}

enum JoinAttempt {
    Rejected(JoinError),
    RoomGone,
}

/// A lobby can fill up or start between routing and joining; a few fresh
/// rooms are tried before giving up.
const JOIN_ATTEMPTS: usize = 3;

/// Tracks running rooms and which one is still in its lobby. New rooms are
/// opened whenever that one has started, filled up or closed.
pub struct RoomManager {
    config: SessionConfig,
    rooms: HashMap<String, RoomHandle>,
    open_room: Option<String>,
}

impl RoomManager {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rooms: HashMap::new(),
            open_room: None,
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Id and command channel of the room new connections should join.
    pub fn lobby(&mut self) -> Result<(String, mpsc::Sender<RoomCommand>), JoinError> {
        self.prune_finished();
        if let Some(room_id) = &self.open_room {
            if let Some(room) = self.rooms.get(room_id) {
                return Ok((room_id.clone(), room.commands()));
            }
        }
        self.open_new_room()
    }

    /// Stops routing to `room_id`; it no longer accepts joins.
    pub fn close_lobby(&mut self, room_id: &str) {
        if self.open_room.as_deref() == Some(room_id) {
            self.open_room = None;
        }
    }

    fn open_new_room(&mut self) -> Result<(String, mpsc::Sender<RoomCommand>), JoinError> {
        let seed: u64 = rand::rng().random();
        let session = match GameSession::new(self.config.clone(), seed) {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "failed to create session");
                return Err(JoinError::Unavailable);
            }
        };
        let room_id = make_id("room");
        info!(room = %room_id, seed, "opening room");
        let room = RoomHandle::spawn(room_id.clone(), session);
        let commands = room.commands();
        self.rooms.insert(room_id.clone(), room);
        self.open_room = Some(room_id.clone());
        Ok((room_id, commands))
    }

    fn prune_finished(&mut self) {
        self.rooms.retain(|_, room| !room.is_finished());
        if let Some(open) = &self.open_room {
            if !self.rooms.contains_key(open) {
                self.open_room = None;
            }
        }
    }
}

/// Places a connection in the open lobby. The manager lock is held only
/// while routing, never while a room handles the join.
pub async fn join_room(
    manager: &Mutex<RoomManager>,
    player_id: &str,
    name: String,
    character_id: u32,
    outbound: mpsc::Sender<OutboundMessage>,
) -> Result<JoinedRoom, JoinError> {
    for _ in 0..JOIN_ATTEMPTS {
        let (room_id, commands) = manager.lock().await.lobby()?;
        match request_join(
            &room_id,
            commands,
            player_id,
            name.clone(),
            character_id,
            outbound.clone(),
        )
        .await
        {
            Ok(joined) => return Ok(joined),
            Err(JoinAttempt::Rejected(JoinError::NotWaiting | JoinError::RoomFull))
            | Err(JoinAttempt::RoomGone) => {
                manager.lock().await.close_lobby(&room_id);
            }
            Err(JoinAttempt::Rejected(err)) => return Err(err),
        }
    }
    Err(JoinError::Unavailable)
}

async fn request_join(
    room_id: &str,
    commands: mpsc::Sender<RoomCommand>,
    player_id: &str,
    name: String,
    character_id: u32,
    outbound: mpsc::Sender<OutboundMessage>,
) -> Result<JoinedRoom, JoinAttempt> {
    let (reply, reply_rx) = oneshot::channel();
    commands
        .send(RoomCommand::Join {
            player_id: player_id.to_string(),
            name,
            character_id,
            outbound,
            reply,
        })
        .await
        .map_err(|_| JoinAttempt::RoomGone)?;
    let snapshot = reply_rx
        .await
        .map_err(|_| JoinAttempt::RoomGone)?
        .map_err(JoinAttempt::Rejected)?;
    Ok(JoinedRoom {
        room_id: room_id.to_string(),
        commands,
        snapshot,
    })
}
