use rand::seq::SliceRandom;

use crate::models::Mood;

const HAPPY: &[&str] = &[
    "Look at you go! I'm so happy to see you working.",
    "That's my kid! Keep it up, sweetheart.",
    "You're doing wonderfully today. I'm smiling over here.",
];

const STERN: &[&str] = &[
    "Young one, I know you're not working right now. Back to it.",
    "I didn't raise you to stare at the screen. Let's get moving.",
    "Enough wandering around. Pick a task and finish it.",
];

const ENCOURAGING: &[&str] = &[
    "You've got this, honey. Just start with one small thing.",
    "Five focused minutes. That's all I'm asking. You can do it.",
    "Every big assignment starts with a single line. Go write it.",
];

const NAGGING: &[&str] = &[
    "Are you working or are you scrolling? Mom knows.",
    "Sweetie, that homework isn't going to do itself.",
    "I'm watching you. Get back to your tasks, please.",
];

const PROUD: &[&str] = &[
    "I'm so proud of you for sticking with it!",
    "Look at all that progress. Mom is beaming.",
    "You kept going even when it was hard. That's my kid.",
];

/// Canned lines for a mood. Never empty.
pub fn pool(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => HAPPY,
        Mood::Stern => STERN,
        Mood::Encouraging => ENCOURAGING,
        Mood::Nagging => NAGGING,
        Mood::Proud => PROUD,
    }
}

/// Uniformly random pick from the pool for `mood`.
pub fn pick(mood: Mood) -> String {
    let lines = pool(mood);
    lines
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(NAGGING[0])
        .to_string()
}

/// True if `text` is one of the canned lines for any mood.
pub fn is_fallback(text: &str) -> bool {
    Mood::ALL.iter().any(|mood| pool(*mood).contains(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pool_has_non_empty_lines() {
        for mood in Mood::ALL {
            assert!(!pool(mood).is_empty());
            assert!(pool(mood).iter().all(|line| !line.trim().is_empty()));
        }
    }

    #[test]
    fn pick_comes_from_the_mood_pool() {
        for mood in Mood::ALL {
            for _ in 0..20 {
                let line = pick(mood);
                assert!(pool(mood).contains(&line.as_str()));
                assert!(is_fallback(&line));
            }
        }
    }
}
