use std::mem;

/// The countdown the session's one-second tick is currently driving.
/// Exactly one is armed at a time and every phase exit replaces it, so a
/// tick can never run a countdown that belongs to a finished phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmedTimer {
    Lobby,
    Play,
    Teardown { remaining_secs: u32 },
    Disarmed,
}

impl ArmedTimer {
    pub fn is_armed(&self) -> bool {
        !matches!(self, Self::Disarmed)
    }

    /// Swaps in `next` and hands back the released timer.
    pub(crate) fn replace(&mut self, next: ArmedTimer) -> ArmedTimer {
        mem::replace(self, next)
    }

    /// Counts the grace period down; true once it has run out.
    pub(crate) fn tick_teardown(&mut self) -> bool {
        let Self::Teardown { remaining_secs } = self else {
            return false;
        };
        *remaining_secs = remaining_secs.saturating_sub(1);
        *remaining_secs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_expires_after_its_seconds() {
        let mut timer = ArmedTimer::Teardown { remaining_secs: 2 };
        assert!(!timer.tick_teardown());
        assert!(timer.tick_teardown());
    }

    #[test]
    fn other_timers_never_expire_as_teardown() {
        let mut timer = ArmedTimer::Play;
        assert!(!timer.tick_teardown());
        assert_eq!(timer.replace(ArmedTimer::Disarmed), ArmedTimer::Play);
        assert!(!timer.is_armed());
    }
}
