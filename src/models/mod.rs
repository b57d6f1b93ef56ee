mod mood;
mod turn;

pub use mood::Mood;
pub use turn::{Speaker, Turn};
