use serde::Serialize;
use tokio::time::Instant;

use crate::models::Mood;
use crate::sensing::MonitorContext;

use super::config::ScopeConfig;

/// The heuristics, one variant per rule.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    RouteIdle,
    SlowTyping,
    RouteHopping,
    Procrastination,
}

/// Evaluation order, highest priority first. The first rule that matches on a
/// tick wins and the rest are skipped.
pub const RULE_PRIORITY: [RuleKind; 4] = [
    RuleKind::RouteIdle,
    RuleKind::SlowTyping,
    RuleKind::RouteHopping,
    RuleKind::Procrastination,
];

/// A fired nag: situational context for the generator plus the mood to use.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NagDecision {
    pub rule: RuleKind,
    pub context: String,
    pub mood: Mood,
}

impl RuleKind {
    pub fn check(&self, scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
        match self {
            RuleKind::RouteIdle => route_idle(scope, ctx, now),
            RuleKind::SlowTyping => slow_typing(scope, ctx, now),
            RuleKind::RouteHopping => route_hopping(scope, ctx, now),
            RuleKind::Procrastination => procrastination(scope, ctx, now),
        }
    }
}

fn route_idle(scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
    let path = ctx.route.current_path.as_str();
    let rule = scope.route_idle.iter().find(|rule| rule.matches(path))?;
    let idle = ctx.activity.idle_for(now);

    if idle.as_millis() < u128::from(rule.idle_ms) {
        return None;
    }

    Some(NagDecision {
        rule: RuleKind::RouteIdle,
        context: format!(
            "The user has been idle for {} seconds on {}, a {} page.",
            idle.as_secs(),
            path,
            rule.label
        ),
        mood: rule.mood,
    })
}

fn slow_typing(scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
    let rule = scope.slow_typing.as_ref()?;
    let activity = &ctx.activity;

    if !activity.is_typing_slow || activity.since_typing(now).as_millis() >= u128::from(rule.grace_ms) {
        return None;
    }

    Some(NagDecision {
        rule: RuleKind::SlowTyping,
        context: format!(
            "The user is typing very slowly ({:.0} characters per minute) on {}.",
            activity.typing_speed_cpm, ctx.route.current_path
        ),
        mood: Mood::Nagging,
    })
}

fn route_hopping(scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
    let rule = scope.route_hopping.as_ref()?;
    let since_change = ctx.route.since_route_change(now);
    let idle = ctx.activity.idle_for(now);

    if since_change.as_millis() >= u128::from(rule.max_since_route_change_ms)
        || idle.as_millis() < u128::from(rule.min_idle_ms)
    {
        return None;
    }

    Some(NagDecision {
        rule: RuleKind::RouteHopping,
        context: format!(
            "The user keeps switching pages without engaging: arrived on {} {} seconds ago but has not interacted for {} seconds.",
            ctx.route.current_path,
            since_change.as_secs(),
            idle.as_secs()
        ),
        mood: Mood::Stern,
    })
}

fn procrastination(scope: &ScopeConfig, ctx: &MonitorContext, now: Instant) -> Option<NagDecision> {
    let threshold_ms = scope.procrastination_idle_ms?;
    let idle = ctx.activity.idle_for(now);

    if idle.as_millis() < u128::from(threshold_ms) {
        return None;
    }

    Some(NagDecision {
        rule: RuleKind::Procrastination,
        context: format!(
            "The user has not interacted with anything for {} minutes and seems to be procrastinating.",
            idle.as_secs() / 60
        ),
        mood: Mood::Encouraging,
    })
}
