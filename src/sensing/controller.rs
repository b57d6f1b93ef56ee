use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::conversation::ConversationController;
use crate::heuristics::ScopeConfig;

use super::loop_worker::monitor_loop;
use super::MonitorContext;

/// Owns the polling worker and the listener registration for one scope.
/// Events are only accepted while `is_listening` is true.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        scope: Arc<ScopeConfig>,
        context: Arc<Mutex<MonitorContext>>,
        conversation: ConversationController,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitoring already active");
        }

        info!(
            "starting '{}' monitor, polling every {:?}",
            scope.name,
            scope.poll_interval()
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(
            scope,
            context,
            conversation,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
