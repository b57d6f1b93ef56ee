pub mod bridge;
pub mod client;
pub mod fallback;

pub use bridge::PromptBridge;
pub use client::{GenerationRequest, HttpTextGenerator, OfflineGenerator, TextGenerator};
