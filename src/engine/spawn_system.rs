use std::collections::HashSet;

use rand::Rng;
use tracing::{info, warn};

use super::*;

impl GameSession {
    pub(super) fn start_game(&mut self) {
        self.timer.replace(ArmedTimer::Disarmed);

        self.backfill_ai();
        self.place_participants();
        self.pick_giant();

        self.phase = Phase::Playing;
        self.game_timer = self.config.game_play_time;
        self.timer.replace(ArmedTimer::Play);
        info!(
            humans = self.registry.human_count(),
            participants = self.registry.len(),
            giant = self.giant_id.as_deref().unwrap_or("-"),
            "game started"
        );
    }

    /// Tops the room up to capacity. AI characters cycle through the
    /// catalog entries no human picked, or the whole catalog if none are
    /// left.
    fn backfill_ai(&mut self) {
        let needed = self
            .config
            .max_participants
            .saturating_sub(self.registry.len());
        if needed == 0 {
            return;
        }

        let used: HashSet<u32> = self.registry.iter().map(|p| p.character_id).collect();
        let available: Vec<u32> = (0..self.config.character_count)
            .filter(|character| !used.contains(character))
            .collect();

        for idx in 0..needed {
            let character_id = if available.is_empty() {
                idx as u32 % self.config.character_count
            } else {
                available[idx % available.len()]
            };
            self.next_ai_seq += 1;
            let id = format!("ai_{}", self.next_ai_seq);
            let player = Player::new(
                id.clone(),
                format!("AI-{}", idx + 1),
                character_id,
                Controller::Ai,
            );
            if !self.registry.insert(player) {
                warn!(player_id = %id, "ai id collided with an existing participant");
            }
        }
    }

    /// Every participant gets a distinct random cell. Config validation
    /// guarantees there are at least as many cells as participants.
    fn place_participants(&mut self) {
        let board_size = self.config.board_size;
        let mut taken: HashSet<Vec2> = HashSet::new();
        for player in self.registry.iter_mut() {
            let cell = loop {
                let candidate = Vec2::new(
                    self.rng.random_range(0..board_size),
                    self.rng.random_range(0..board_size),
                );
                if taken.insert(candidate) {
                    break candidate;
                }
            };
            player.pos = cell;
        }
    }

    fn pick_giant(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let idx = self.rng.random_range(0..self.registry.len());
        if let Some(player) = self.registry.iter_mut().nth(idx) {
            player.role = Role::Giant;
            self.giant_id = Some(player.id.clone());
        }
    }
}
