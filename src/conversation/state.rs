use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Mood, Turn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Closed,
    /// A nag fired and its opening line is being generated. Not visible yet.
    Opening,
    Open,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Closed
    }
}

/// Read-only view handed to the rendering layer.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub is_open: bool,
    pub is_minimized: bool,
    pub transcript: Vec<Turn>,
    pub is_awaiting_response: bool,
    pub mood: Option<Mood>,
}

/// Handle for a pending bridge call. The result is only applied while the
/// session that issued it is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub episode_id: String,
    pub mood: Mood,
    pub context: String,
    pub user_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub status: SessionStatus,
    pub episode_id: Option<String>,
    pub turns: Vec<Turn>,
    pub is_minimized: bool,
    pub is_awaiting_response: bool,
    pub mood: Option<Mood>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// True while a session exists or one is being opened.
    pub fn is_engaged(&self) -> bool {
        self.status != SessionStatus::Closed
    }

    /// Reserve the session slot for a new episode. Fails if one is already
    /// open or opening; the nag is dropped rather than queued.
    pub fn begin_open(&mut self, episode_id: String, mood: Mood, context: String) -> Option<PendingReply> {
        if self.is_engaged() {
            return None;
        }

        *self = Self {
            status: SessionStatus::Opening,
            episode_id: Some(episode_id.clone()),
            turns: Vec::new(),
            is_minimized: false,
            is_awaiting_response: true,
            mood: Some(mood),
        };

        Some(PendingReply {
            episode_id,
            mood,
            context,
            user_message: None,
        })
    }

    /// Append the user's reply and hand back the bridge call to make.
    pub fn begin_reply(&mut self, text: &str) -> Result<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            bail!("empty reply ignored");
        }
        if !self.is_open() {
            bail!("no open conversation to reply to");
        }
        if self.is_awaiting_response {
            bail!("still waiting for the previous answer");
        }

        let (Some(episode_id), Some(mood)) = (self.episode_id.clone(), self.mood) else {
            bail!("open conversation is missing its episode");
        };

        self.turns.push(Turn::user(text.to_string()));
        self.is_awaiting_response = true;

        Ok(PendingReply {
            episode_id,
            mood,
            context: text.to_string(),
            user_message: Some(text.to_string()),
        })
    }

    /// Apply a finished bridge call. Returns `false` if the episode it belongs
    /// to has been closed in the meantime; the text is then discarded.
    pub fn complete(&mut self, pending: &PendingReply, text: String) -> bool {
        if self.episode_id.as_deref() != Some(pending.episode_id.as_str()) || !self.is_engaged() {
            return false;
        }

        self.turns.push(Turn::mom(text, pending.mood));
        self.status = SessionStatus::Open;
        self.is_awaiting_response = false;
        true
    }

    pub fn toggle_minimize(&mut self) -> bool {
        if self.is_open() {
            self.is_minimized = !self.is_minimized;
        }
        self.is_minimized
    }

    /// Dismiss the session and drop its transcript.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            is_open: self.is_open(),
            is_minimized: self.is_minimized,
            transcript: if self.is_open() { self.turns.clone() } else { Vec::new() },
            is_awaiting_response: self.is_awaiting_response,
            mood: self.mood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Speaker;

    fn opened(mood: Mood) -> ConversationState {
        let mut state = ConversationState::new();
        let pending = state.begin_open("ep-1".into(), mood, "idle".into()).unwrap();
        assert!(state.complete(&pending, "Hi honey.".into()));
        state
    }

    #[test]
    fn opening_reserves_slot_until_first_line_lands() {
        let mut state = ConversationState::new();
        let pending = state
            .begin_open("ep-1".into(), Mood::Nagging, "idle on /feed".into())
            .unwrap();

        assert_eq!(state.status, SessionStatus::Opening);
        assert!(state.is_awaiting_response);
        assert!(!state.snapshot().is_open);
        assert!(state.begin_open("ep-2".into(), Mood::Stern, "other".into()).is_none());

        assert!(state.complete(&pending, "Back to work.".into()));
        let snapshot = state.snapshot();
        assert!(snapshot.is_open);
        assert!(!snapshot.is_minimized);
        assert!(!snapshot.is_awaiting_response);
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.transcript[0].speaker, Speaker::Mom);
        assert_eq!(snapshot.transcript[0].mood, Some(Mood::Nagging));
    }

    #[test]
    fn reply_appends_user_turn_before_mom_answers() {
        let mut state = opened(Mood::Stern);

        let pending = state.begin_reply("  ok  ").unwrap();
        assert_eq!(pending.context, "ok");
        assert_eq!(pending.mood, Mood::Stern);
        assert!(state.is_awaiting_response);
        assert_eq!(state.turns.last().unwrap().speaker, Speaker::User);
        assert_eq!(state.turns.last().unwrap().text, "ok");

        assert!(state.complete(&pending, "Good.".into()));
        let speakers: Vec<_> = state.turns.iter().map(|t| t.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Mom, Speaker::User, Speaker::Mom]);
        assert!(!state.is_awaiting_response);
    }

    #[test]
    fn reply_rejected_while_awaiting() {
        let mut state = opened(Mood::Nagging);
        state.begin_reply("first").unwrap();
        let before = state.turns.clone();

        assert!(state.begin_reply("ok").is_err());
        assert_eq!(state.turns, before);
    }

    #[test]
    fn empty_reply_and_closed_session_are_rejected() {
        let mut state = opened(Mood::Happy);
        assert!(state.begin_reply("   ").is_err());
        assert_eq!(state.turns.len(), 1);
        assert!(!state.is_awaiting_response);

        let mut closed = ConversationState::new();
        assert!(closed.begin_reply("hello").is_err());
        assert!(closed.turns.is_empty());
    }

    #[test]
    fn close_clears_transcript_and_drops_late_reply() {
        let mut state = opened(Mood::Stern);
        let pending = state.begin_reply("fine").unwrap();

        state.close();
        assert!(!state.complete(&pending, "too late".into()));
        assert!(state.turns.is_empty());
        assert_eq!(state.snapshot(), ConversationSnapshot::default());

        // The next episode starts from an empty transcript.
        let next = state.begin_open("ep-2".into(), Mood::Happy, "x".into()).unwrap();
        assert!(state.complete(&next, "Hello again.".into()));
        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].text, "Hello again.");
    }

    #[test]
    fn late_reply_from_previous_episode_is_ignored() {
        let mut state = opened(Mood::Stern);
        let stale = state.begin_reply("fine").unwrap();
        state.close();
        let fresh = state.begin_open("ep-2".into(), Mood::Happy, "x".into()).unwrap();

        assert!(!state.complete(&stale, "old answer".into()));
        assert!(state.turns.is_empty());
        assert!(state.complete(&fresh, "new answer".into()));
    }

    #[test]
    fn minimize_is_orthogonal_to_session_state() {
        let mut state = opened(Mood::Proud);
        assert!(state.toggle_minimize());
        assert!(state.is_open());

        state.begin_reply("thanks").unwrap();
        assert!(state.is_minimized);
        assert!(!state.toggle_minimize());

        let mut closed = ConversationState::new();
        assert!(!closed.toggle_minimize());
    }
}
