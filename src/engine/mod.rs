use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::constants::{FAST_START_HUMAN_COUNT, FAST_START_WAITING_SECS, TEARDOWN_GRACE_SECS};
use crate::error::{ConfigError, JoinError};
use crate::types::{Controller, Direction, EndReason, Phase, Role, Snapshot, Vec2, Winner};

pub mod ai;
pub mod catches;
pub mod grid;
pub mod movement;
pub mod registry;
pub mod timer;

mod spawn_system;

use self::ai::AiPolicy;
use self::catches::{all_runners_caught, detect_catches};
use self::movement::attempt_move;
use self::registry::{Player, Registry};
use self::timer::ArmedTimer;

/// Authoritative state of one room: lobby, chase, result.
///
/// All mutation goes through `join`, `leave`, `receive_move` and `tick`;
/// the host must call them from a single task per session.
#[derive(Clone, Debug)]
pub struct GameSession {
    config: SessionConfig,
    phase: Phase,
    waiting_timer: u32,
    game_timer: u32,
    winner: Winner,
    end_reason: Option<EndReason>,
    giant_id: Option<String>,
    registry: Registry,
    timer: ArmedTimer,
    disposed: bool,
    rng: StdRng,
    next_ai_seq: u64,
    ai_only: bool,
}

impl GameSession {
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            phase: Phase::Waiting,
            waiting_timer: config.lobby_waiting_time,
            game_timer: config.game_play_time,
            winner: Winner::None,
            end_reason: None,
            giant_id: None,
            registry: Registry::new(),
            timer: ArmedTimer::Lobby,
            disposed: false,
            rng: StdRng::seed_from_u64(seed),
            next_ai_seq: 0,
            ai_only: false,
            config,
        })
    }

    /// Lets the session run with no humans at all, for headless simulation.
    /// Without it a game never starts or keeps going with nobody connected.
    pub fn with_ai_only(mut self) -> Self {
        self.ai_only = true;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn waiting_timer(&self) -> u32 {
        self.waiting_timer
    }

    pub fn game_timer(&self) -> u32 {
        self.game_timer
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn armed_timer(&self) -> ArmedTimer {
        self.timer
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Still accepting joins.
    pub fn is_open(&self) -> bool {
        !self.disposed
            && self.phase == Phase::Waiting
            && self.registry.len() < self.config.max_participants
    }

    pub fn join(&mut self, id: String, name: String, character_id: u32) -> Result<(), JoinError> {
        if self.disposed || self.phase != Phase::Waiting {
            return Err(JoinError::NotWaiting);
        }
        if self.registry.contains(&id) {
            return Err(JoinError::DuplicateId);
        }
        if self.registry.len() >= self.config.max_participants {
            return Err(JoinError::RoomFull);
        }
        if character_id >= self.config.character_count {
            return Err(JoinError::UnknownCharacter(character_id));
        }

        info!(player_id = %id, name = %name, character_id, "player joined");
        self.registry
            .insert(Player::new(id, name, character_id, Controller::Human));

        if self.registry.human_count() >= FAST_START_HUMAN_COUNT
            && self.waiting_timer > FAST_START_WAITING_SECS
        {
            self.waiting_timer = FAST_START_WAITING_SECS;
            debug!(waiting_timer = self.waiting_timer, "lobby countdown shortened");
        }
        Ok(())
    }

    /// Lobby leavers are removed. Mid-game leavers stay in the registry,
    /// flagged disconnected; the game is abandoned once no connected human
    /// remains. Returns whether published state changed.
    pub fn leave(&mut self, id: &str) -> bool {
        let Some(player) = self.registry.get(id) else {
            return false;
        };
        if player.is_ai() {
            return false;
        }

        match self.phase {
            Phase::Waiting => {
                self.registry.remove(id);
                info!(player_id = %id, "player left lobby");
                true
            }
            Phase::Playing | Phase::Ended => {
                let was_connected = self
                    .registry
                    .get_mut(id)
                    .map(|player| std::mem::replace(&mut player.connected, false))
                    .unwrap_or(false);
                if was_connected {
                    info!(player_id = %id, "player disconnected");
                }
                if self.phase == Phase::Playing && self.registry.connected_human_count() == 0 {
                    self.abandon();
                    return true;
                }
                was_connected
            }
        }
    }

    /// Human move request. Dropped outside Playing, for unknown or caught
    /// senders, and when the target cell is taken. Returns whether anything
    /// moved.
    pub fn receive_move(&mut self, id: &str, dir: Direction) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some(player) = self.registry.get(id) else {
            return false;
        };
        if player.is_caught() || player.is_ai() {
            return false;
        }
        let from = player.pos;
        let is_giant = player.is_giant();

        let Some(to) = attempt_move(&mut self.registry, id, dir, self.config.board_size) else {
            return false;
        };
        let caught = if is_giant {
            self.run_catches()
        } else {
            0
        };
        to != from || caught > 0
    }

    /// Advances whichever timer is armed by one second. Returns whether
    /// published state changed.
    pub fn tick(&mut self) -> bool {
        match self.timer {
            ArmedTimer::Lobby => {
                self.tick_waiting();
                true
            }
            ArmedTimer::Play => {
                self.tick_playing();
                true
            }
            ArmedTimer::Teardown { .. } => {
                if self.timer.tick_teardown() {
                    info!("grace period over, tearing down");
                    self.dispose();
                }
                false
            }
            ArmedTimer::Disarmed => false,
        }
    }

    /// Releases every timer. Later ticks are no-ops.
    pub fn dispose(&mut self) {
        self.timer.replace(ArmedTimer::Disarmed);
        self.disposed = true;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            board_size: self.config.board_size,
            waiting_timer: self.waiting_timer,
            game_timer: self.game_timer,
            winner: self.winner,
            end_reason: self.end_reason,
            giant_id: self.giant_id.clone(),
            players: self.registry.views(),
        }
    }

    fn tick_waiting(&mut self) {
        self.waiting_timer = self.waiting_timer.saturating_sub(1);
        if self.waiting_timer > 0 {
            return;
        }
        if !self.ai_only && self.registry.human_count() == 0 {
            info!("lobby closed with nobody in it");
            self.dispose();
            return;
        }
        self.start_game();
    }

    fn tick_playing(&mut self) {
        if !self.ai_only && self.registry.connected_human_count() == 0 {
            self.abandon();
            return;
        }
        self.game_timer = self.game_timer.saturating_sub(1);
        self.move_ai_players();

        // A catch on the final second still counts for the giant.
        if all_runners_caught(&self.registry) {
            self.end_game(Winner::Giant, EndReason::AllCaught);
        } else if self.game_timer == 0 {
            self.end_game(Winner::Players, EndReason::TimeUp);
        }
    }

    fn abandon(&mut self) {
        let winner = if self.game_timer == 0 {
            Winner::Players
        } else {
            Winner::Giant
        };
        self.end_game(winner, EndReason::Abandoned);
    }

    fn move_ai_players(&mut self) {
        let board_size = self.config.board_size;
        for id in self.registry.ai_ids() {
            let Some(policy) = self.registry.get(&id).and_then(AiPolicy::for_player) else {
                continue;
            };
            let Some(cell) = policy.decide(&self.registry, &id, board_size, &mut self.rng) else {
                continue;
            };
            if let Some(player) = self.registry.get_mut(&id) {
                player.pos = cell;
            }
            if policy == AiPolicy::Pursuit {
                self.run_catches();
            }
        }
    }

    fn run_catches(&mut self) -> usize {
        let caught = detect_catches(&mut self.registry);
        for player_id in &caught {
            info!(player_id = %player_id, "runner caught");
        }
        caught.len()
    }

    fn end_game(&mut self, winner: Winner, reason: EndReason) {
        if self.phase == Phase::Ended {
            return;
        }
        self.timer.replace(ArmedTimer::Teardown {
            remaining_secs: TEARDOWN_GRACE_SECS,
        });
        self.phase = Phase::Ended;
        self.winner = winner;
        self.end_reason = Some(reason);
        for player in self.registry.iter_mut() {
            player.role = Role::Runner;
        }
        info!(?winner, ?reason, game_timer = self.game_timer, "game ended");
    }
}
