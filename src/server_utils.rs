use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::MAX_NAME_CHARS;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}

/// Process-unique id such as `player_12`.
pub fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_applies_trim_empty_and_max_len() {
        assert_eq!(sanitize_name(""), "Player");
        assert_eq!(sanitize_name("   "), "Player");
        assert_eq!(sanitize_name(" Alice "), "Alice");
        assert_eq!(sanitize_name("12345678901234567890"), "1234567890123456");
    }

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = make_id("player");
        let b = make_id("player");
        assert_ne!(a, b);
        assert!(a.starts_with("player_"));
    }
}
