use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mood;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Speaker {
    Mom,
    User,
}

/// One line of the transcript, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn mom(text: String, mood: Mood) -> Self {
        Self {
            speaker: Speaker::Mom,
            text,
            mood: Some(mood),
            at: Utc::now(),
        }
    }

    pub fn user(text: String) -> Self {
        Self {
            speaker: Speaker::User,
            text,
            mood: None,
            at: Utc::now(),
        }
    }
}
