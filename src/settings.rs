use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::conversation::DEFAULT_REPLY_DELAY;
use crate::heuristics::{config::path_has_prefix, ScopeConfig};
use crate::prompt::bridge::DEFAULT_GENERATION_TIMEOUT;

pub const ENDPOINT_ENV: &str = "MOM_MODE_ENDPOINT";
pub const SCOPE_ENV: &str = "MOM_MODE_SCOPE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSettings {
    /// Where generation requests are posted. `None` means always use fallback
    /// lines.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: DEFAULT_GENERATION_TIMEOUT.as_millis() as u64,
        }
    }
}

impl GeneratorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-field tweaks applied on top of the chosen scope preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeOverrides {
    pub poll_interval_ms: Option<u64>,
    pub procrastination_idle_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub reply_delay_ms: u64,
    pub scope: String,
    pub overrides: ScopeOverrides,
    /// A full scope definition; replaces the preset when present.
    pub custom_scope: Option<ScopeConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::default(),
            reply_delay_ms: DEFAULT_REPLY_DELAY.as_millis() as u64,
            scope: "global".into(),
            overrides: ScopeOverrides::default(),
            custom_scope: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file gives the defaults; a file
    /// that does not parse is logged and also gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("Ignoring malformed settings at {}: {err}", path.display());
            Self::default()
        }))
    }

    /// Apply `MOM_MODE_ENDPOINT` and `MOM_MODE_SCOPE` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            let endpoint = endpoint.trim().to_string();
            self.generator.endpoint = (!endpoint.is_empty()).then_some(endpoint);
        }
        if let Ok(scope) = std::env::var(SCOPE_ENV) {
            self.scope = scope.trim().to_string();
        }
        self
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// The effective scope: custom definition, else preset plus overrides.
    pub fn scope_config(&self) -> ScopeConfig {
        if let Some(custom) = &self.custom_scope {
            return custom.clone();
        }

        let mut scope = ScopeConfig::by_name(&self.scope).unwrap_or_else(|| {
            warn!("Unknown scope '{}', using global", self.scope);
            ScopeConfig::global()
        });
        if let Some(poll) = self.overrides.poll_interval_ms {
            scope.poll_interval_ms = poll;
        }
        if let Some(idle) = self.overrides.procrastination_idle_ms {
            scope.procrastination_idle_ms = Some(idle);
        }
        scope
    }
}

/// The user's on/off preference plus the routes that are never monitored.
/// Read-only to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceGate {
    /// `None` while the preference is still loading.
    pub enabled: Option<bool>,
    pub excluded_routes: Vec<String>,
}

impl Default for PreferenceGate {
    fn default() -> Self {
        Self {
            enabled: None,
            excluded_routes: ["/login", "/signup", "/auth", "/onboarding", "/reset-password"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PreferenceGate {
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_routes
            .iter()
            .any(|prefix| path_has_prefix(path, prefix))
    }

    pub fn allows(&self, path: &str) -> bool {
        self.enabled == Some(true) && !self.is_excluded(path)
    }
}
