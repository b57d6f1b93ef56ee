use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::conversation::ConversationController;
use crate::heuristics::{evaluate, NagDecision, ScopeConfig};

use super::MonitorContext;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Poll the monitor context on the scope's cadence until cancelled. Ticks that
/// fall behind are skipped, never replayed.
pub async fn monitor_loop(
    scope: Arc<ScopeConfig>,
    context: Arc<Mutex<MonitorContext>>,
    conversation: ConversationController,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(scope.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(decision) = run_tick(&scope, &context, &conversation).await {
                    let Some(pending) = conversation.begin_episode(&decision).await else {
                        continue;
                    };
                    let conversation = conversation.clone();
                    tokio::spawn(async move { conversation.finish(pending).await });
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop for scope '{}' shutting down", scope.name);
                break;
            }
        }
    }
}

/// One evaluation against the current state. Everything is read fresh through
/// the shared handles.
pub async fn run_tick(
    scope: &ScopeConfig,
    context: &Mutex<MonitorContext>,
    conversation: &ConversationController,
) -> Option<NagDecision> {
    let now = Instant::now();
    let guard = conversation.guard().await;
    let decision = {
        let ctx = context.lock().await;
        evaluate(scope, &ctx, guard, now)
    };

    match &decision {
        Some(decision) => log_info!(
            "[{}] nag fired: rule={:?} mood={}",
            scope.name,
            decision.rule,
            decision.mood
        ),
        None if !guard.is_clear() => log_debug!("[{}] tick suppressed, conversation active", scope.name),
        None => {}
    }

    decision
}
