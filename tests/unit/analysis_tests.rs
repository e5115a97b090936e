/*!
 * Tests for content analysis
 */

use anyhow::Result;
use subnarrate::analysis::ContentAnalyzer;
use subnarrate::subtitle_processor::{SubtitleParser, TimedSegment};
use crate::common;

fn segments(texts: &[&str]) -> Vec<TimedSegment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| TimedSegment::new(i + 1, i as f64 * 2.0, i as f64 * 2.0 + 2.0, *text))
        .collect()
}

/// Test character extraction from dialogue prefixes and parentheticals
#[test]
fn test_analyze_withDialoguePrefixes_shouldFindCharacters() -> Result<()> {
    let parsed = SubtitleParser::parse(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "bad.srt")?;
    let analysis = ContentAnalyzer::analyze(&parsed.segments);

    assert!(analysis.characters.contains("Anna"));
    assert!(analysis.characters.contains("Ben"));
    assert_eq!(analysis.segment_count, 4);
    Ok(())
}

/// Test that setting words and stage directions are not characters
#[test]
fn test_analyze_withSettingPrefixes_shouldIgnoreThem() {
    let analysis = ContentAnalyzer::analyze(&segments(&[
        "Scene: a quiet cafe",
        "Music: soft piano",
        "(laughs) okay then",
        "Meet me at 10:30",
    ]));

    assert!(analysis.characters.is_empty(), "unexpected characters: {:?}", analysis.characters);
}

/// Test Chinese name detection next to speech verbs
#[test]
fn test_analyze_withChineseSpeechVerbs_shouldFindNames() {
    let analysis = ContentAnalyzer::analyze(&segments(&["小明：你去哪里了？", "李华对小明说不要担心"]));

    assert!(analysis.characters.contains("小明"));
    assert!(analysis.characters.contains("李华"));
}

/// Test themes and emotions
#[test]
fn test_analyze_withKeywords_shouldTagThemesAndEmotions() {
    let analysis = ContentAnalyzer::analyze(&segments(&[
        "My family kept a secret for years.",
        "I was so scared when I found out.",
        "But now I am happy again.",
    ]));

    assert!(analysis.themes.contains("family"));
    assert!(analysis.themes.contains("mystery"));
    assert!(analysis.emotions.contains("fear"));
    assert!(analysis.emotions.contains("joy"));
}

/// Test that partial words do not tag themes
#[test]
fn test_analyze_withKeywordInsideWord_shouldNotTag() {
    let analysis = ContentAnalyzer::analyze(&segments(&["She lost a glove in the snow."]));
    assert!(!analysis.themes.contains("romance"));
}

/// Test statistics
#[test]
fn test_analyze_withSegments_shouldComputeDensityAndLengths() {
    let analysis = ContentAnalyzer::analyze(&segments(&["abcd", "ef"]));

    assert_eq!(analysis.total_characters, 6);
    assert_eq!(analysis.average_segment_length, 3.0);
    assert_eq!(analysis.dialogue_density, 0.5);
}

/// Test key phrase ranking
#[test]
fn test_analyze_withRepeatedWords_shouldRankKeyPhrases() {
    let analysis = ContentAnalyzer::analyze(&segments(&[
        "run run run",
        "hide, hide!",
        "run away",
    ]));

    assert_eq!(analysis.key_phrases.first().map(String::as_str), Some("run"));
    assert!(analysis.key_phrases.contains(&"hide".to_string()));
    assert!(!analysis.key_phrases.contains(&"away".to_string()));
}

/// Test empty input
#[test]
fn test_analyze_withNoSegments_shouldReturnDefault() {
    let analysis = ContentAnalyzer::analyze(&[]);
    assert_eq!(analysis, Default::default());
}
