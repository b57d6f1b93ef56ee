use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Typing slower than this (characters per minute) counts as slow.
pub const SLOW_TYPING_CPM: f64 = 30.0;
/// Slow typing is only judged once the sample has more keystrokes than this.
pub const MIN_KEYSTROKES_FOR_SPEED: u32 = 10;

/// Raw interaction events fed in by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InteractionEvent {
    PointerDown,
    PointerMove,
    Scroll,
    TouchStart,
    KeyPress,
}

impl InteractionEvent {
    pub fn is_keystroke(&self) -> bool {
        matches!(self, InteractionEvent::KeyPress)
    }
}

/// Running activity measures for the current episode.
#[derive(Debug, Clone)]
pub struct ActivityState {
    pub last_activity_at: Instant,
    pub last_typing_at: Instant,
    pub keystroke_count: u32,
    pub window_start_at: Instant,
    pub typing_speed_cpm: f64,
    pub is_typing_slow: bool,
}

impl ActivityState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_activity_at: now,
            last_typing_at: now,
            keystroke_count: 0,
            window_start_at: now,
            typing_speed_cpm: 0.0,
            is_typing_slow: false,
        }
    }

    /// Pointer, scroll and touch events.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity_at = self.last_activity_at.max(now);
    }

    pub fn record_keystroke(&mut self, now: Instant) {
        self.record_activity(now);
        self.last_typing_at = self.last_typing_at.max(now);
        self.keystroke_count = self.keystroke_count.saturating_add(1);
        self.recompute_speed(now);
    }

    pub fn record(&mut self, event: InteractionEvent, now: Instant) {
        if event.is_keystroke() {
            self.record_keystroke(now);
        } else {
            self.record_activity(now);
        }
    }

    /// Drop the typing sample. Called on every route change.
    pub fn reset_typing(&mut self, now: Instant) {
        self.keystroke_count = 0;
        self.window_start_at = now;
        self.typing_speed_cpm = 0.0;
        self.is_typing_slow = false;
    }

    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_activity_at)
    }

    pub fn since_typing(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_typing_at)
    }

    fn recompute_speed(&mut self, now: Instant) {
        let minutes = now
            .saturating_duration_since(self.window_start_at)
            .as_secs_f64()
            / 60.0;

        self.typing_speed_cpm = if minutes > 0.0 {
            self.keystroke_count as f64 / minutes
        } else {
            0.0
        };
        self.is_typing_slow = is_slow(self.keystroke_count, self.typing_speed_cpm);
    }
}

fn is_slow(keystroke_count: u32, typing_speed_cpm: f64) -> bool {
    typing_speed_cpm < SLOW_TYPING_CPM && keystroke_count > MIN_KEYSTROKES_FOR_SPEED
}
