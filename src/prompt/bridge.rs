use std::sync::Arc;
use std::time::Duration;

use crate::models::Mood;

use super::client::{GenerationRequest, TextGenerator};
use super::fallback;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Wraps the text generator so callers always get a line back. Failures and
/// timeouts fall back to the canned pool for the mood; nothing is retried.
#[derive(Clone)]
pub struct PromptBridge {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl PromptBridge {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn generate(&self, context: &str, mood: Mood, prior_user_message: Option<&str>) -> String {
        let request = GenerationRequest {
            context: context.to_string(),
            user_message: prior_user_message.map(str::to_string),
            mood,
        };

        match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                log_debug!("generated {mood} reply ({} chars)", text.len());
                text
            }
            Ok(Ok(_)) => {
                log_warn!("generator returned an empty {mood} reply, using fallback");
                fallback::pick(mood)
            }
            Ok(Err(err)) => {
                log_warn!("generation failed, using fallback: {err:#}");
                fallback::pick(mood)
            }
            Err(_) => {
                log_warn!("generation timed out after {:?}, using fallback", self.timeout);
                fallback::pick(mood)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed result and remembers what it was asked.
    pub(crate) struct ScriptedGenerator {
        pub reply: Result<String, String>,
        pub seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        pub fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|reason| anyhow!(reason))
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl TextGenerator for StalledGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn passes_generated_text_through() {
        let generator = ScriptedGenerator::ok("Homework. Now.");
        let bridge = PromptBridge::new(generator.clone());

        let text = bridge.generate("idle on /feed", Mood::Stern, Some("five more minutes")).await;

        assert_eq!(text, "Homework. Now.");
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].user_message.as_deref(), Some("five more minutes"));
        assert_eq!(seen[0].mood, Mood::Stern);
    }

    #[tokio::test]
    async fn network_error_falls_back_to_pool() {
        let bridge = PromptBridge::new(ScriptedGenerator::failing("connection refused"));

        let text = bridge.generate("X", Mood::Nagging, None).await;

        assert!(!text.is_empty());
        assert!(fallback::pool(Mood::Nagging).contains(&text.as_str()));
    }

    #[tokio::test]
    async fn blank_reply_falls_back_to_pool() {
        let bridge = PromptBridge::new(ScriptedGenerator::ok("   "));

        let text = bridge.generate("X", Mood::Proud, None).await;

        assert!(fallback::pool(Mood::Proud).contains(&text.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_generator_times_out_to_fallback() {
        let bridge =
            PromptBridge::new(Arc::new(StalledGenerator)).with_timeout(Duration::from_secs(2));

        let text = bridge.generate("X", Mood::Encouraging, None).await;

        assert!(fallback::pool(Mood::Encouraging).contains(&text.as_str()));
    }
}
