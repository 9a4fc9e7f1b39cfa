use crate::engine::registry::Registry;

/// Marks every uncaught runner standing on the giant's cell as caught and
/// returns the ids caught by this call. Safe to run repeatedly.
pub fn detect_catches(registry: &mut Registry) -> Vec<String> {
    let Some(giant_cell) = registry.giant().map(|giant| giant.pos) else {
        return Vec::new();
    };
    let mut caught = Vec::new();
    for player in registry.iter_mut() {
        if player.is_runner() && player.pos == giant_cell && player.mark_caught() {
            caught.push(player.id.clone());
        }
    }
    caught
}

pub fn all_runners_caught(registry: &Registry) -> bool {
    registry
        .iter()
        .filter(|player| !player.is_giant())
        .all(|player| player.is_caught())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::Player;
    use crate::types::{Controller, Role, Vec2};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        for (id, x, y) in [("g", 3, 3), ("a", 3, 3), ("b", 4, 3), ("c", 3, 3)] {
            let mut player = Player::new(id.to_string(), id.to_string(), 0, Controller::Ai);
            player.pos = Vec2::new(x, y);
            registry.insert(player);
        }
        registry.get_mut("g").expect("giant exists").role = Role::Giant;
        registry
    }

    #[test]
    fn catches_everyone_on_giant_cell() {
        let mut registry = registry();
        assert_eq!(detect_catches(&mut registry), vec!["a", "c"]);
        assert!(!registry.get("b").expect("b exists").is_caught());
        assert!(!registry.get("g").expect("g exists").is_caught());
    }

    #[test]
    fn second_run_changes_nothing() {
        let mut registry = registry();
        detect_catches(&mut registry);
        let before: Vec<bool> = registry.iter().map(|p| p.is_caught()).collect();
        assert!(detect_catches(&mut registry).is_empty());
        let after: Vec<bool> = registry.iter().map(|p| p.is_caught()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn no_giant_means_no_catches() {
        let mut registry = registry();
        registry.get_mut("g").expect("giant exists").role = Role::Runner;
        assert!(detect_catches(&mut registry).is_empty());
    }

    #[test]
    fn all_caught_ignores_the_giant() {
        let mut registry = registry();
        assert!(!all_runners_caught(&registry));
        for id in ["a", "b", "c"] {
            registry.get_mut(id).expect("runner exists").caught = true;
        }
        assert!(all_runners_caught(&registry));
    }
}
