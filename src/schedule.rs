//! Pending callbacks on the engine's serialized queue.
//!
//! Two triggers exist: a draw request, which runs as soon as the loop is free,
//! and the rotation timer, a one-shot deadline re-armed after every tick.
//! Both are plain state here; the wallpaper task turns them into futures.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Nothing to rotate: multi mode off, fewer than two candidates, or the
    /// engine is hidden.
    Idle,
    /// A rotation tick is due at the given instant.
    Armed { due: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    draw_pending: bool,
    rotation: RotationState,
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub const fn new() -> Self {
        Self {
            draw_pending: false,
            rotation: RotationState::Idle,
        }
    }

    pub fn post_draw(&mut self) {
        self.draw_pending = true;
    }

    /// Consume the pending draw, if any.
    pub fn take_draw(&mut self) -> bool {
        std::mem::take(&mut self.draw_pending)
    }

    pub const fn draw_pending(&self) -> bool {
        self.draw_pending
    }

    /// Schedule the next rotation `interval` after `now`, replacing any
    /// pending one.
    pub fn arm_rotation(&mut self, now: Instant, interval: Duration) {
        self.rotation = RotationState::Armed {
            due: now + interval,
        };
    }

    pub fn cancel_rotation(&mut self) {
        self.rotation = RotationState::Idle;
    }

    /// Drop both the pending draw and the rotation timer.
    pub fn cancel_all(&mut self) {
        self.draw_pending = false;
        self.rotation = RotationState::Idle;
    }

    pub const fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub const fn rotation_deadline(&self) -> Option<Instant> {
        match self.rotation {
            RotationState::Armed { due } => Some(due),
            RotationState::Idle => None,
        }
    }

    /// Whether the rotation timer has fired at `now`.
    pub fn rotation_due(&self, now: Instant) -> bool {
        matches!(self.rotation, RotationState::Armed { due } if due <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_is_consumed_once() {
        let mut timers = Timers::new();
        timers.post_draw();
        timers.post_draw();
        assert!(timers.take_draw());
        assert!(!timers.take_draw());
    }

    #[test]
    fn rotation_fires_at_deadline() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.arm_rotation(now, Duration::from_secs(60));
        assert!(!timers.rotation_due(now + Duration::from_secs(59)));
        assert!(timers.rotation_due(now + Duration::from_secs(60)));
        assert_eq!(timers.rotation_deadline(), Some(now + Duration::from_secs(60)));
    }

    #[test]
    fn rearming_replaces_deadline() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.arm_rotation(now, Duration::from_secs(60));
        timers.arm_rotation(now, Duration::from_secs(5));
        assert_eq!(timers.rotation_deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn cancel_all_clears_both() {
        let mut timers = Timers::new();
        timers.post_draw();
        timers.arm_rotation(Instant::now(), Duration::from_secs(1));
        timers.cancel_all();
        assert!(!timers.draw_pending());
        assert_eq!(timers.rotation(), RotationState::Idle);
    }
}
