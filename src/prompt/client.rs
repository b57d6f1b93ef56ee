//! Text-generation collaborator.
//!
//! The wire contract is a single JSON exchange:
//! request `{context, userMessage?, mood}`, response `{message}`.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::Mood;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    pub mood: Mood,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    message: Option<String>,
}

/// Anything that can turn a situation and a mood into a line of dialogue.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Posts requests to an HTTP endpoint.
pub struct HttpTextGenerator {
    client: Client,
    endpoint: String,
}

impl HttpTextGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| anyhow!("generation request failed: {err}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read generation response body")?;

        if !status.is_success() {
            bail!("generation endpoint returned {status}: {body}");
        }

        let parsed: GenerationResponse = serde_json::from_str(&body)
            .with_context(|| format!("malformed generation response: {body}"))?;

        let message = parsed
            .message
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if message.is_empty() {
            bail!("generation response had no message");
        }

        Ok(message)
    }
}

/// Used when no endpoint is configured. Every call fails, so the bridge always
/// answers from the fallback pool.
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(anyhow!("no generation endpoint configured"))
    }
}
