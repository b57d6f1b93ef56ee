use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{debug, info};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::heuristics::{NagDecision, SessionGuard};
use crate::prompt::PromptBridge;

use super::state::{ConversationSnapshot, ConversationState, PendingReply};

/// Pause before mom answers a user reply, to pace the turn-taking.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1_000);

/// Owns the one conversation session of a monitored scope and publishes a
/// snapshot after every change.
#[derive(Clone)]
pub struct ConversationController {
    state: Arc<Mutex<ConversationState>>,
    bridge: PromptBridge,
    reply_delay: Duration,
    snapshots: Arc<watch::Sender<ConversationSnapshot>>,
}

impl ConversationController {
    pub fn new(bridge: PromptBridge, reply_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(ConversationSnapshot::default());
        Self {
            state: Arc::new(Mutex::new(ConversationState::new())),
            bridge,
            reply_delay,
            snapshots: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn guard(&self) -> SessionGuard {
        let state = self.state.lock().await;
        SessionGuard {
            session_open: state.is_engaged(),
            request_in_flight: state.is_awaiting_response,
        }
    }

    /// Reserve the session for a fired nag. `None` if one is already open or
    /// opening.
    pub async fn begin_episode(&self, decision: &NagDecision) -> Option<PendingReply> {
        let mut state = self.state.lock().await;
        let pending = state.begin_open(
            Uuid::new_v4().to_string(),
            decision.mood,
            decision.context.clone(),
        );
        if pending.is_some() {
            self.publish(&state);
        } else {
            debug!("nag {:?} dropped, conversation already active", decision.rule);
        }
        pending
    }

    /// Ask the bridge for mom's line and append it if the episode is still
    /// current.
    pub async fn finish(&self, pending: PendingReply) {
        let text = self
            .bridge
            .generate(&pending.context, pending.mood, pending.user_message.as_deref())
            .await;

        let mut state = self.state.lock().await;
        if state.complete(&pending, text) {
            self.publish(&state);
        } else {
            info!("discarding reply for closed episode {}", pending.episode_id);
        }
    }

    /// Open a session for `decision` and wait for its first line.
    pub async fn open_with(&self, decision: &NagDecision) -> bool {
        match self.begin_episode(decision).await {
            Some(pending) => {
                self.finish(pending).await;
                true
            }
            None => false,
        }
    }

    /// Append the user's reply, then wait for mom's answer. Rejected without
    /// touching the transcript when the text is blank, no session is open or
    /// an answer is still pending.
    pub async fn submit_user_reply(&self, text: &str) -> Result<()> {
        let pending = {
            let mut state = self.state.lock().await;
            let pending = state.begin_reply(text)?;
            self.publish(&state);
            pending
        };

        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }

        self.finish(pending).await;
        Ok(())
    }

    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.is_engaged() {
            info!("conversation closed after {} turns", state.turns.len());
        }
        state.close();
        self.publish(&state);
    }

    pub async fn toggle_minimize(&self) -> bool {
        let mut state = self.state.lock().await;
        let minimized = state.toggle_minimize();
        self.publish(&state);
        minimized
    }

    fn publish(&self, state: &ConversationState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::RuleKind;
    use crate::models::{Mood, Speaker};
    use crate::prompt::bridge::tests::ScriptedGenerator;
    use crate::prompt::{fallback, GenerationRequest, TextGenerator};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn decision(mood: Mood) -> NagDecision {
        NagDecision {
            rule: RuleKind::RouteIdle,
            context: "X".into(),
            mood,
        }
    }

    /// Opening lines come back at once; answers to user replies wait for the
    /// gate.
    struct GatedGenerator {
        gate: Notify,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
            if request.user_message.is_some() {
                self.gate.notified().await;
            }
            Ok(format!("re: {}", request.context))
        }
    }

    async fn wait_for_awaiting(controller: &ConversationController) {
        for _ in 0..100 {
            if controller.snapshot().await.is_awaiting_response {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("reply never went in flight");
    }

    #[tokio::test]
    async fn failing_bridge_still_lands_a_fallback_turn() {
        let controller = ConversationController::new(
            PromptBridge::new(ScriptedGenerator::failing("network down")),
            Duration::ZERO,
        );

        assert!(controller.open_with(&decision(Mood::Nagging)).await);

        let snapshot = controller.snapshot().await;
        assert!(snapshot.is_open);
        assert!(!snapshot.is_awaiting_response);
        assert_eq!(snapshot.transcript.len(), 1);
        let text = &snapshot.transcript[0].text;
        assert!(!text.is_empty());
        assert!(fallback::pool(Mood::Nagging).contains(&text.as_str()));
    }

    #[tokio::test]
    async fn failing_bridge_on_reply_returns_to_idle() {
        let controller = ConversationController::new(
            PromptBridge::new(ScriptedGenerator::failing("timeout")),
            Duration::ZERO,
        );
        controller.open_with(&decision(Mood::Stern)).await;

        controller.submit_user_reply("I'm working!").await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.transcript.len(), 3);
        assert!(fallback::is_fallback(&snapshot.transcript[2].text));
        assert!(!snapshot.is_awaiting_response);
    }

    #[tokio::test]
    async fn second_nag_while_open_is_dropped() {
        let controller = ConversationController::new(
            PromptBridge::new(ScriptedGenerator::ok("Hi.")),
            Duration::ZERO,
        );

        assert!(controller.open_with(&decision(Mood::Nagging)).await);
        assert!(!controller.open_with(&decision(Mood::Stern)).await);

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.mood, Some(Mood::Nagging));
    }

    #[tokio::test]
    async fn reply_rejected_while_answer_in_flight() {
        let generator = Arc::new(GatedGenerator { gate: Notify::new() });
        let controller =
            ConversationController::new(PromptBridge::new(generator.clone()), Duration::ZERO);
        controller.open_with(&decision(Mood::Nagging)).await;

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_user_reply("first").await })
        };
        wait_for_awaiting(&controller).await;
        let before = controller.snapshot().await.transcript;

        assert!(controller.submit_user_reply("ok").await.is_err());
        assert_eq!(controller.snapshot().await.transcript, before);

        generator.gate.notify_one();
        first.await.unwrap().unwrap();

        let snapshot = controller.snapshot().await;
        let texts: Vec<_> = snapshot.transcript.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["re: X", "first", "re: first"]);
        assert!(!snapshot.is_awaiting_response);
    }

    #[tokio::test]
    async fn close_during_reply_discards_late_answer() {
        let generator = Arc::new(GatedGenerator { gate: Notify::new() });
        let controller =
            ConversationController::new(PromptBridge::new(generator.clone()), Duration::ZERO);
        controller.open_with(&decision(Mood::Stern)).await;

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_user_reply("later").await })
        };
        wait_for_awaiting(&controller).await;

        controller.close().await;
        generator.gate.notify_one();
        pending.await.unwrap().unwrap();

        let snapshot = controller.snapshot().await;
        assert!(!snapshot.is_open);
        assert!(snapshot.transcript.is_empty());
        assert!(!snapshot.is_awaiting_response);
    }

    #[tokio::test(start_paused = true)]
    async fn user_turn_is_visible_during_reply_delay() {
        let controller = ConversationController::new(
            PromptBridge::new(ScriptedGenerator::ok("Noted.")),
            Duration::from_secs(1),
        );
        controller.open_with(&decision(Mood::Happy)).await;
        let mut updates = controller.subscribe();

        let reply = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit_user_reply("done!").await })
        };

        updates.changed().await.unwrap();
        {
            let seen = updates.borrow_and_update();
            assert!(seen.is_awaiting_response);
            assert_eq!(seen.transcript.last().unwrap().speaker, Speaker::User);
        }

        reply.await.unwrap().unwrap();
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.transcript.last().unwrap().speaker, Speaker::Mom);
        assert!(!snapshot.is_awaiting_response);
    }

    #[tokio::test]
    async fn minimize_publishes_snapshot() {
        let controller = ConversationController::new(
            PromptBridge::new(ScriptedGenerator::ok("Hi.")),
            Duration::ZERO,
        );
        controller.open_with(&decision(Mood::Proud)).await;
        let updates = controller.subscribe();

        assert!(controller.toggle_minimize().await);
        assert!(updates.borrow().is_minimized);
        assert!(updates.borrow().is_open);
    }
}
