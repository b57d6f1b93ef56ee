use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{debug, info};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::conversation::{ConversationController, ConversationSnapshot};
use crate::heuristics::ScopeConfig;
use crate::prompt::{HttpTextGenerator, OfflineGenerator, PromptBridge, TextGenerator};
use crate::sensing::{InteractionEvent, MonitorContext, MonitorController};
use crate::settings::{PreferenceGate, Settings};

/// One monitored scope: the shared monitor context, the polling worker and the
/// conversation it can open. Hosts own this and pass it around by reference.
pub struct MomMode {
    scope: Arc<ScopeConfig>,
    context: Arc<Mutex<MonitorContext>>,
    conversation: ConversationController,
    monitor: Mutex<MonitorController>,
    gate: Mutex<PreferenceGate>,
}

impl MomMode {
    pub fn new(
        scope: ScopeConfig,
        bridge: PromptBridge,
        reply_delay: Duration,
        initial_path: &str,
    ) -> Self {
        Self {
            scope: Arc::new(scope),
            context: Arc::new(Mutex::new(MonitorContext::new(initial_path, Instant::now()))),
            conversation: ConversationController::new(bridge, reply_delay),
            monitor: Mutex::new(MonitorController::new()),
            gate: Mutex::new(PreferenceGate::default()),
        }
    }

    pub fn from_settings(settings: &Settings, initial_path: &str) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> = match &settings.generator.endpoint {
            Some(endpoint) => {
                info!("text generation via {endpoint}");
                Arc::new(HttpTextGenerator::new(endpoint.clone(), settings.generator.timeout())?)
            }
            None => {
                info!("no generation endpoint configured, using canned lines only");
                Arc::new(OfflineGenerator)
            }
        };
        let bridge = PromptBridge::new(generator).with_timeout(settings.generator.timeout());

        Ok(Self::new(
            settings.scope_config(),
            bridge,
            settings.reply_delay(),
            initial_path,
        ))
    }

    pub fn scope(&self) -> &ScopeConfig {
        &self.scope
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.conversation.subscribe()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        self.conversation.snapshot().await
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.lock().await.is_listening()
    }

    pub async fn current_path(&self) -> String {
        self.context.lock().await.route.current_path.clone()
    }

    /// Feed a raw interaction event. Returns `false` when monitoring is off
    /// and the event was dropped.
    pub async fn record_interaction(&self, event: InteractionEvent) -> bool {
        if !self.monitor.lock().await.is_listening() {
            return false;
        }
        self.context.lock().await.activity.record(event, Instant::now());
        true
    }

    /// Commit a navigation, then start or stop monitoring for the new path.
    pub async fn navigate(&self, path: &str) -> Result<()> {
        let changed = self.context.lock().await.navigate(path, Instant::now());
        if changed {
            debug!("[{}] route -> {path}", self.scope.name);
        }
        self.reconcile().await
    }

    /// React to the preference store. `None` means it is still loading.
    pub async fn set_preference(&self, enabled: Option<bool>) -> Result<()> {
        self.gate.lock().await.enabled = enabled;
        self.reconcile().await
    }

    pub async fn set_excluded_routes(&self, routes: Vec<String>) -> Result<()> {
        self.gate.lock().await.excluded_routes = routes;
        self.reconcile().await
    }

    /// Bring the worker in line with the preference and the current route.
    pub async fn reconcile(&self) -> Result<()> {
        let path = self.current_path().await;
        let wanted = self.gate.lock().await.allows(&path) && self.scope.is_eligible(&path);

        let mut monitor = self.monitor.lock().await;
        match (wanted, monitor.is_listening()) {
            (true, false) => {
                *self.context.lock().await = MonitorContext::new(path, Instant::now());
                monitor.start(
                    self.scope.clone(),
                    self.context.clone(),
                    self.conversation.clone(),
                )?;
            }
            (false, true) => {
                info!("[{}] monitoring paused on {path}", self.scope.name);
                monitor.stop().await?;
                self.conversation.close().await;
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn submit_user_reply(&self, text: &str) -> Result<()> {
        self.conversation.submit_user_reply(text).await
    }

    pub async fn close(&self) {
        self.conversation.close().await;
    }

    pub async fn toggle_minimize(&self) -> bool {
        self.conversation.toggle_minimize().await
    }

    /// Tear everything down, as on unmount.
    pub async fn shutdown(&self) -> Result<()> {
        self.monitor.lock().await.stop().await?;
        self.conversation.close().await;
        Ok(())
    }
}
