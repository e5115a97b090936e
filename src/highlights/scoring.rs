//! Importance scoring for highlight candidates.
//!
//! The score is a pure function of the narration text and the known
//! character names, clamped to `[0, 1]`.

use std::collections::BTreeSet;

use crate::analysis::keywords::{contains_keyword, IMPORTANCE_KEYWORDS};

pub const BASE_SCORE: f64 = 0.7;
pub const KEYWORD_INCREMENT: f64 = 0.05;
pub const MULTI_KEYWORD_BONUS: f64 = 0.1;
pub const SHORT_LENGTH_THRESHOLD: usize = 20;
pub const LONG_LENGTH_THRESHOLD: usize = 50;
pub const LENGTH_BONUS: f64 = 0.05;
pub const PUNCTUATION_BONUS: f64 = 0.05;
pub const DIALOGUE_FRAME_BONUS: f64 = 0.05;
pub const QUOTATION_BONUS: f64 = 0.05;
pub const CHARACTER_BONUS: f64 = 0.1;

const QUOTE_MARKS: [char; 5] = ['"', '\u{201C}', '\u{201D}', '\u{300C}', '\u{300D}'];

/// Score how notable `text` is
pub fn importance(text: &str, characters: &BTreeSet<String>) -> f64 {
    let mut score = BASE_SCORE;

    let distinct: BTreeSet<&str> = IMPORTANCE_KEYWORDS
        .iter()
        .flat_map(|(_, words)| words.iter().copied())
        .filter(|kw| contains_keyword(text, kw))
        .collect();
    score += distinct.len() as f64 * KEYWORD_INCREMENT;
    if distinct.len() >= 2 {
        score += MULTI_KEYWORD_BONUS;
    }

    let length = text.chars().count();
    if length > SHORT_LENGTH_THRESHOLD {
        score += LENGTH_BONUS;
    }
    if length > LONG_LENGTH_THRESHOLD {
        score += LENGTH_BONUS;
    }

    if text.contains(['?', '!', '？', '！']) {
        score += PUNCTUATION_BONUS;
    }
    if text.contains([':', '：']) {
        score += DIALOGUE_FRAME_BONUS;
    }
    if text.contains(QUOTE_MARKS) {
        score += QUOTATION_BONUS;
    }
    if characters.iter().any(|name| !name.is_empty() && text.contains(name.as_str())) {
        score += CHARACTER_BONUS;
    }

    score.clamp(0.0, 1.0)
}
