pub mod config;
pub mod evaluator;
pub mod rules;

pub use config::{RouteHoppingRule, RouteIdleRule, ScopeConfig, SlowTypingRule};
pub use evaluator::{evaluate, SessionGuard};
pub use rules::{NagDecision, RuleKind, RULE_PRIORITY};
