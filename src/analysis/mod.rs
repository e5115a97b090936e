/*!
 * Lightweight content analysis over parsed subtitle segments.
 *
 * Everything here is a pure function of the segment texts and timings:
 * - character-name candidates (`characters`)
 * - theme and emotion tags from keyword tables (`keywords`)
 * - recurring key phrases
 * - pacing figures (dialogue density, average segment length)
 */

pub mod characters;
pub mod keywords;

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::TimedSegment;

use keywords::{matching_labels, EMOTION_KEYWORDS, THEME_KEYWORDS};

/// Maximum number of key phrases reported
pub const MAX_KEY_PHRASES: usize = 15;

const DENSITY_EPSILON: f64 = 1e-6;

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s]").expect("Invalid punctuation regex")
});

/// Signals derived from a subtitle track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleAnalysis {
    /// Character-name candidates
    pub characters: BTreeSet<String>,
    /// Theme labels found in the text
    pub themes: BTreeSet<String>,
    /// Emotion labels found in the text
    pub emotions: BTreeSet<String>,
    /// Most frequent repeated tokens, most frequent first
    pub key_phrases: Vec<String>,
    /// Segments per second of transcript
    pub dialogue_density: f64,
    /// Mean characters per segment
    pub average_segment_length: f64,
    /// Characters across all segments
    pub total_characters: usize,
    /// Number of segments analyzed
    pub segment_count: usize,
}

/// Stateless analyzer turning segments into a [`SubtitleAnalysis`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    /// Analyze a segment list. An empty list yields the default analysis.
    pub fn analyze(segments: &[TimedSegment]) -> SubtitleAnalysis {
        if segments.is_empty() {
            return SubtitleAnalysis::default();
        }

        let all_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let total_characters: usize = segments.iter().map(|s| s.text.chars().count()).sum();
        let last_end = segments.last().map(|s| s.end).unwrap_or(0.0);

        SubtitleAnalysis {
            characters: characters::extract_characters(segments.iter().map(|s| s.text.as_str())),
            themes: to_set(matching_labels(THEME_KEYWORDS, &all_text)),
            emotions: to_set(matching_labels(EMOTION_KEYWORDS, &all_text)),
            key_phrases: key_phrases(&all_text),
            dialogue_density: segments.len() as f64 / last_end.max(DENSITY_EPSILON),
            average_segment_length: total_characters as f64 / segments.len() as f64,
            total_characters,
            segment_count: segments.len(),
        }
    }
}

fn to_set(labels: Vec<&'static str>) -> BTreeSet<String> {
    labels.into_iter().map(str::to_string).collect()
}

/// Top repeated tokens: punctuation stripped, single characters ignored,
/// ties kept in order of first appearance.
pub fn key_phrases(text: &str) -> Vec<String> {
    let cleaned = PUNCTUATION.replace_all(text, "");

    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for token in cleaned.split_whitespace() {
        if token.chars().count() <= 1 {
            continue;
        }
        match position.get(token) {
            Some(&i) => order[i].1 += 1,
            None => {
                position.insert(token, order.len());
                order.push((token, 1));
            }
        }
    }

    order.sort_by(|a, b| b.1.cmp(&a.1));

    order
        .into_iter()
        .take(MAX_KEY_PHRASES)
        .filter(|(_, count)| *count > 1)
        .map(|(token, _)| token.to_string())
        .collect()
}
