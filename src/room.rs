use std::collections::HashMap;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::constants::{ROOM_COMMAND_CAPACITY, TICK};
use crate::engine::GameSession;
use crate::error::JoinError;
use crate::server_protocol::{state_message, welcome_message};
use crate::types::{Direction, Phase, Snapshot};

#[derive(Clone, Debug)]
pub enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// Everything that may mutate a room. Commands and timer ticks are handled
/// one at a time by the room task.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: String,
        name: String,
        character_id: u32,
        outbound: mpsc::Sender<OutboundMessage>,
        reply: oneshot::Sender<Result<Snapshot, JoinError>>,
    },
    Move {
        player_id: String,
        direction: Direction,
    },
    Leave {
        player_id: String,
    },
}

pub struct RoomHandle {
    id: String,
    commands: mpsc::Sender<RoomCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    pub fn spawn(id: String, session: GameSession) -> Self {
        let (commands, rx) = mpsc::channel(ROOM_COMMAND_CAPACITY);
        let actor = RoomActor {
            id: id.clone(),
            session,
            clients: HashMap::new(),
        };
        let task = tokio::spawn(run_room(actor, rx));
        Self { id, commands, task }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn commands(&self) -> mpsc::Sender<RoomCommand> {
        self.commands.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the room task to exit.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(room = %self.id, error = %err, "room task failed");
        }
    }
}

struct RoomActor {
    id: String,
    session: GameSession,
    clients: HashMap<String, mpsc::Sender<OutboundMessage>>,
}

async fn run_room(mut actor: RoomActor, mut commands: mpsc::Receiver<RoomCommand>) {
    info!(room = %actor.id, "room opened");
    let mut interval = time::interval_at(Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => actor.on_tick(),
            command = commands.recv() => match command {
                Some(command) => actor.on_command(command),
                None => break,
            },
        }
        if actor.session.is_disposed() {
            break;
        }
    }

    // Dropping the interval here cancels the room's timer with the task.
    actor.close_all("room closed");
    info!(room = %actor.id, "room closed");
}

impl RoomActor {
    fn on_tick(&mut self) {
        let phase_before = self.session.phase();
        if self.session.tick() {
            self.broadcast_state(self.policy_since(phase_before));
        }
    }

    fn on_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                player_id,
                name,
                character_id,
                outbound,
                reply,
            } => {
                let snapshot = match self.session.join(player_id.clone(), name, character_id) {
                    Ok(()) => self.session.snapshot(),
                    Err(err) => {
                        debug!(room = %self.id, player_id = %player_id, error = %err, "join refused");
                        let _ = reply.send(Err(err));
                        self.dispose_if_lobby_empty();
                        return;
                    }
                };

                let welcome = welcome_message(&player_id, &self.id, &snapshot).to_string();
                let welcomed = outbound.try_send(OutboundMessage::Text(welcome)).is_ok();
                if welcomed && reply.send(Ok(snapshot)).is_ok() {
                    self.clients.insert(player_id, outbound);
                } else {
                    debug!(room = %self.id, player_id = %player_id, "joiner went away");
                    self.session.leave(&player_id);
                    self.dispose_if_lobby_empty();
                }
                self.broadcast_state(QueuePolicy::DisconnectOnFull);
            }
            RoomCommand::Move {
                player_id,
                direction,
            } => {
                if self.session.receive_move(&player_id, direction) {
                    self.broadcast_state(QueuePolicy::DropOnFull);
                }
            }
            RoomCommand::Leave { player_id } => {
                self.clients.remove(&player_id);
                let phase_before = self.session.phase();
                let changed = self.session.leave(&player_id);
                self.dispose_if_lobby_empty();
                if changed {
                    self.broadcast_state(self.policy_since(phase_before));
                }
            }
        }
    }

    fn policy_since(&self, phase_before: Phase) -> QueuePolicy {
        if self.session.phase() == phase_before {
            QueuePolicy::DropOnFull
        } else {
            QueuePolicy::DisconnectOnFull
        }
    }

    fn dispose_if_lobby_empty(&mut self) {
        if self.session.phase() == Phase::Waiting
            && self.session.registry().human_count() == 0
            && !self.session.is_disposed()
        {
            info!(room = %self.id, "lobby empty, disposing");
            self.session.dispose();
        }
    }

    fn broadcast_state(&mut self, policy: QueuePolicy) {
        loop {
            let payload = state_message(&self.session.snapshot()).to_string();
            let mut failed = Vec::new();
            for (player_id, tx) in &self.clients {
                match tx.try_send(OutboundMessage::Text(payload.clone())) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) if policy == QueuePolicy::DropOnFull => {}
                    Err(_) => failed.push(player_id.clone()),
                }
            }
            if failed.is_empty() {
                return;
            }

            let mut changed = false;
            for player_id in failed {
                warn!(room = %self.id, player_id = %player_id, "dropping unresponsive client");
                if let Some(tx) = self.clients.remove(&player_id) {
                    let _ = tx.try_send(OutboundMessage::Close {
                        code: 4002,
                        reason: "outbound queue full".to_string(),
                    });
                }
                changed |= self.session.leave(&player_id);
            }
            self.dispose_if_lobby_empty();
            if !changed {
                return;
            }
        }
    }

    fn close_all(&mut self, reason: &str) {
        for (_, tx) in self.clients.drain() {
            let _ = tx.try_send(OutboundMessage::Close {
                code: 1000,
                reason: reason.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::config::SessionConfig;
    use crate::constants::CLIENT_QUEUE_CAPACITY;

    fn spawn_room(config: SessionConfig) -> RoomHandle {
        let session = GameSession::new(config, 3).expect("valid config");
        RoomHandle::spawn("room_test".to_string(), session)
    }

    async fn join(
        room: &RoomHandle,
        player_id: &str,
        character_id: u32,
    ) -> (
        Result<Snapshot, JoinError>,
        mpsc::Receiver<OutboundMessage>,
    ) {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let (reply_tx, reply_rx) = oneshot::channel();
        room.commands()
            .send(RoomCommand::Join {
                player_id: player_id.to_string(),
                name: player_id.to_uppercase(),
                character_id,
                outbound: tx,
                reply: reply_tx,
            })
            .await
            .expect("room should be alive");
        (reply_rx.await.expect("room should reply"), rx)
    }

    async fn next_json(rx: &mut mpsc::Receiver<OutboundMessage>) -> Value {
        match rx.recv().await {
            Some(OutboundMessage::Text(raw)) => serde_json::from_str(&raw).expect("valid json"),
            other => panic!("expected text message, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_game_and_teardown_reach_client() {
        let room = spawn_room(SessionConfig {
            lobby_waiting_time: 2,
            game_play_time: 2,
            max_participants: 2,
            ..SessionConfig::default()
        });
        let (joined, mut rx) = join(&room, "p1", 0).await;
        assert_eq!(joined.expect("lobby join").phase, Phase::Waiting);

        let welcome = next_json(&mut rx).await;
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["playerId"], "p1");
        assert_eq!(welcome["roomId"], "room_test");

        let state = next_json(&mut rx).await;
        assert_eq!(state["state"]["waitingTimer"], 1);

        let state = next_json(&mut rx).await;
        assert_eq!(state["state"]["phase"], "playing");
        assert_eq!(state["state"]["players"].as_array().map(Vec::len), Some(2));

        let mut state = next_json(&mut rx).await;
        if state["state"]["phase"] == "playing" {
            state = next_json(&mut rx).await;
        }
        assert_eq!(state["state"]["phase"], "ended");
        assert_ne!(state["state"]["winner"], "none");

        match rx.recv().await {
            Some(OutboundMessage::Close { code, .. }) => assert_eq!(code, 1000),
            other => panic!("expected close after grace period, got {other:?}"),
        }
        tokio::time::timeout(Duration::from_secs(5), room.wait())
            .await
            .expect("room task should exit");
    }

    #[tokio::test(start_paused = true)]
    async fn late_join_is_refused() {
        let room = spawn_room(SessionConfig {
            lobby_waiting_time: 1,
            ..SessionConfig::default()
        });
        let (joined, _rx) = join(&room, "p1", 0).await;
        assert!(joined.is_ok());

        time::sleep(Duration::from_millis(1_500)).await;
        let (late, _late_rx) = join(&room, "p2", 1).await;
        assert_eq!(late.err(), Some(JoinError::NotWaiting));
    }

    #[tokio::test(start_paused = true)]
    async fn last_lobby_leave_closes_room() {
        let room = spawn_room(SessionConfig::default());
        let (joined, _rx) = join(&room, "p1", 0).await;
        assert!(joined.is_ok());

        room.commands()
            .send(RoomCommand::Leave {
                player_id: "p1".to_string(),
            })
            .await
            .expect("room should be alive");
        tokio::time::timeout(Duration::from_secs(5), room.wait())
            .await
            .expect("empty lobby should close");
    }

    #[tokio::test(start_paused = true)]
    async fn refused_first_join_closes_room_before_any_game() {
        let room = spawn_room(SessionConfig {
            lobby_waiting_time: 2,
            ..SessionConfig::default()
        });
        let (joined, _rx) = join(&room, "p1", 99).await;
        assert_eq!(joined.err(), Some(JoinError::UnknownCharacter(99)));
        tokio::time::timeout(Duration::from_secs(1), room.wait())
            .await
            .expect("room with an empty lobby should close");
    }

    #[tokio::test(start_paused = true)]
    async fn joiner_that_stops_listening_is_not_kept() {
        let room = spawn_room(SessionConfig::default());
        let (tx, _rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let (reply_tx, reply_rx) = oneshot::channel();
        drop(reply_rx);
        room.commands()
            .send(RoomCommand::Join {
                player_id: "p1".to_string(),
                name: "P1".to_string(),
                character_id: 0,
                outbound: tx,
                reply: reply_tx,
            })
            .await
            .expect("room should be alive");
        tokio::time::timeout(Duration::from_secs(1), room.wait())
            .await
            .expect("lobby left without humans should close");
    }
}
