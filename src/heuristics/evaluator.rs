use tokio::time::Instant;

use crate::sensing::MonitorContext;

use super::config::ScopeConfig;
use super::rules::{NagDecision, RULE_PRIORITY};

/// Conversation state the evaluator has to respect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionGuard {
    pub session_open: bool,
    pub request_in_flight: bool,
}

impl SessionGuard {
    pub fn is_clear(&self) -> bool {
        !self.session_open && !self.request_in_flight
    }
}

/// Run one tick. `None` means no nag this tick, either because nothing matched
/// or because a session or request is already outstanding. Suppressed matches
/// are dropped, not queued.
pub fn evaluate(
    scope: &ScopeConfig,
    ctx: &MonitorContext,
    guard: SessionGuard,
    now: Instant,
) -> Option<NagDecision> {
    if !guard.is_clear() {
        return None;
    }

    first_match(scope, ctx, now)
}

/// Highest-priority matching rule, ignoring the session guard.
pub fn first_match(scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
    RULE_PRIORITY
        .iter()
        .find_map(|rule| rule.check(scope, ctx, now))
}
