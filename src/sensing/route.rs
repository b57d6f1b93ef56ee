use std::time::Duration;

use tokio::time::Instant;

use super::signals::ActivityState;

#[derive(Debug, Clone)]
pub struct RouteState {
    pub current_path: String,
    pub entered_at: Instant,
}

impl RouteState {
    pub fn new(path: impl Into<String>, now: Instant) -> Self {
        Self {
            current_path: path.into(),
            entered_at: now,
        }
    }

    /// Time spent on the current view.
    pub fn dwell(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    pub fn since_route_change(&self, now: Instant) -> Duration {
        self.dwell(now)
    }

    /// Commit a navigation. Returns `false` when the path did not change, in
    /// which case neither the dwell clock nor the typing sample is touched.
    pub fn commit(&mut self, path: &str, now: Instant, activity: &mut ActivityState) -> bool {
        if self.current_path == path {
            return false;
        }

        self.current_path = path.to_string();
        self.entered_at = now;
        activity.reset_typing(now);
        true
    }
}

/// The monitor context: everything the evaluator reads on each tick.
#[derive(Debug, Clone)]
pub struct MonitorContext {
    pub activity: ActivityState,
    pub route: RouteState,
}

impl MonitorContext {
    pub fn new(path: impl Into<String>, now: Instant) -> Self {
        Self {
            activity: ActivityState::new(now),
            route: RouteState::new(path, now),
        }
    }

    pub fn navigate(&mut self, path: &str, now: Instant) -> bool {
        self.route.commit(path, now, &mut self.activity)
    }
}
