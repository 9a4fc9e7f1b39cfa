use crate::types::{Controller, PlayerView, Role, Vec2};

#[derive(Clone, Debug)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub character_id: u32,
    pub pos: Vec2,
    pub(crate) role: Role,
    pub(crate) controller: Controller,
    pub(crate) caught: bool,
    pub(crate) connected: bool,
}

impl Player {
    pub fn new(id: String, name: String, character_id: u32, controller: Controller) -> Self {
        Self {
            id,
            name,
            character_id,
            pos: Vec2::default(),
            role: Role::Runner,
            controller,
            caught: false,
            connected: controller == Controller::Human,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_giant(&self) -> bool {
        self.role == Role::Giant
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    pub fn is_caught(&self) -> bool {
        self.caught
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Uncaught and not the giant.
    pub fn is_runner(&self) -> bool {
        self.role == Role::Runner && !self.caught
    }

    /// Returns true only on the first call; the flag never reverts.
    pub(crate) fn mark_caught(&mut self) -> bool {
        if self.caught || self.is_giant() {
            return false;
        }
        self.caught = true;
        true
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.clone(),
            name: self.name.clone(),
            character_id: self.character_id,
            x: self.pos.x,
            y: self.pos.y,
            is_giant: self.is_giant(),
            is_caught: self.caught,
            is_ai: self.is_ai(),
            connected: self.connected,
        }
    }
}

/// Participants of one session, iterated in insertion order (humans in join
/// order, then AI in creation order).
#[derive(Clone, Debug, Default)]
pub struct Registry {
    players: Vec<Player>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    /// Returns false and leaves the registry untouched on a duplicate id.
    pub fn insert(&mut self, player: Player) -> bool {
        if self.contains(&player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|player| player.id == id)?;
        Some(self.players.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn giant(&self) -> Option<&Player> {
        self.players.iter().find(|player| player.is_giant())
    }

    pub fn human_count(&self) -> usize {
        self.players.iter().filter(|player| !player.is_ai()).count()
    }

    pub fn connected_human_count(&self) -> usize {
        self.players
            .iter()
            .filter(|player| !player.is_ai() && player.connected)
            .count()
    }

    pub fn ai_ids(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|player| player.is_ai())
            .map(|player| player.id.clone())
            .collect()
    }

    pub fn views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(id: &str) -> Player {
        Player::new(id.to_string(), id.to_uppercase(), 0, Controller::Human)
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut registry = Registry::new();
        assert!(registry.insert(human("a")));
        assert!(!registry.insert(human("a")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn iteration_keeps_insertion_order_after_removal() {
        let mut registry = Registry::new();
        for id in ["a", "b", "c"] {
            registry.insert(human(id));
        }
        assert!(registry.remove("b").is_some());
        assert!(registry.remove("b").is_none());
        let ids: Vec<&str> = registry.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn giant_is_never_marked_caught() {
        let mut player = human("g");
        player.role = Role::Giant;
        assert!(!player.mark_caught());
        assert!(!player.is_caught());
    }

    #[test]
    fn human_counts_track_connection() {
        let mut registry = Registry::new();
        registry.insert(human("a"));
        registry.insert(human("b"));
        registry.insert(Player::new("ai_1".into(), "AI-1".into(), 3, Controller::Ai));
        registry.get_mut("a").expect("a exists").connected = false;
        assert_eq!(registry.human_count(), 2);
        assert_eq!(registry.connected_human_count(), 1);
        assert_eq!(registry.ai_ids(), vec!["ai_1".to_string()]);
    }
}
