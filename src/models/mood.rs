use serde::{Deserialize, Serialize};
use std::fmt;

/// Tone tag carried by a nag. Selects the fallback pool and is forwarded to
/// the text generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Stern,
    Encouraging,
    Nagging,
    Proud,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Stern,
        Mood::Encouraging,
        Mood::Nagging,
        Mood::Proud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Stern => "stern",
            Mood::Encouraging => "encouraging",
            Mood::Nagging => "nagging",
            Mood::Proud => "proud",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Happy
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
