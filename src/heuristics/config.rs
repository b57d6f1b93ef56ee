use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::Mood;

/// Idle threshold that applies while the user sits under a route prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteIdleRule {
    pub prefix: String,
    pub idle_ms: u64,
    pub mood: Mood,
    /// Human wording for the page kind, used in the generation context.
    pub label: String,
}

impl RouteIdleRule {
    pub fn new(prefix: &str, idle_ms: u64, mood: Mood, label: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            idle_ms,
            mood,
            label: label.to_string(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path_has_prefix(path, &self.prefix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlowTypingRule {
    /// Slow typing only counts while the last keystroke is this recent.
    pub grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteHoppingRule {
    pub max_since_route_change_ms: u64,
    pub min_idle_ms: u64,
}

/// Configuration for one engine instance with tunable thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeConfig {
    pub name: String,

    pub poll_interval_ms: u64,

    /// Route prefixes the scope watches. Empty means every route.
    #[serde(default)]
    pub eligible_routes: Vec<String>,

    /// First match wins, so list narrower prefixes first.
    #[serde(default)]
    pub route_idle: Vec<RouteIdleRule>,

    #[serde(default)]
    pub slow_typing: Option<SlowTypingRule>,

    #[serde(default)]
    pub route_hopping: Option<RouteHoppingRule>,

    #[serde(default)]
    pub procrastination_idle_ms: Option<u64>,
}

impl ScopeConfig {
    /// Site-wide monitor.
    pub fn global() -> Self {
        Self {
            name: "global".into(),
            poll_interval_ms: 2_000,
            eligible_routes: Vec::new(),
            route_idle: vec![
                RouteIdleRule::new("/social", 8_000, Mood::Nagging, "distraction-prone"),
                RouteIdleRule::new("/feed", 8_000, Mood::Nagging, "distraction-prone"),
                RouteIdleRule::new("/music", 8_000, Mood::Nagging, "distraction-prone"),
                RouteIdleRule::new("/explore", 8_000, Mood::Nagging, "distraction-prone"),
                RouteIdleRule::new("/tasks", 45_000, Mood::Stern, "productivity"),
                RouteIdleRule::new("/calendar", 45_000, Mood::Stern, "productivity"),
                RouteIdleRule::new("/notes", 45_000, Mood::Stern, "productivity"),
            ],
            slow_typing: Some(SlowTypingRule { grace_ms: 3_000 }),
            route_hopping: Some(RouteHoppingRule {
                max_since_route_change_ms: 10_000,
                min_idle_ms: 20_000,
            }),
            procrastination_idle_ms: Some(120_000),
        }
    }

    /// Task-page monitor with a slower cadence.
    pub fn focus() -> Self {
        Self {
            name: "focus".into(),
            poll_interval_ms: 15_000,
            eligible_routes: vec!["/focus".into()],
            route_idle: vec![RouteIdleRule::new("/focus", 60_000, Mood::Stern, "focus session")],
            slow_typing: Some(SlowTypingRule { grace_ms: 3_000 }),
            route_hopping: None,
            procrastination_idle_ms: Some(300_000),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "global" => Some(Self::global()),
            "focus" => Some(Self::focus()),
            _ => None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn is_eligible(&self, path: &str) -> bool {
        self.eligible_routes.is_empty()
            || self
                .eligible_routes
                .iter()
                .any(|prefix| path_has_prefix(path, prefix))
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::global()
    }
}

/// Segment-aware prefix match: `/feed` matches `/feed` and `/feed/42` but not
/// `/feedback`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
