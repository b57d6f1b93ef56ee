pub mod controller;
pub mod state;

pub use controller::{ConversationController, DEFAULT_REPLY_DELAY};
pub use state::{ConversationSnapshot, ConversationState, PendingReply, SessionStatus};
