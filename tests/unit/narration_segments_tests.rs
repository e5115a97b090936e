/*!
 * Tests for narration segment parsing
 */

use subnarrate::analysis::SubtitleAnalysis;
use subnarrate::diagnostics::Diagnostic;
use subnarrate::narration::{NarrationRequest, NarrationSegmentParser, TemplateNarrator};
use crate::common;

/// Test that out-of-order markers keep source order and are not sorted
#[test]
fn test_parse_withOutOfOrderMarkers_shouldKeepSourceOrder() {
    let parser = NarrationSegmentParser::default();
    let segments = parser.parse("[00:05] First.\n[00:03] Second.", &[]);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "First.");
    assert_eq!(segments[1].text, "Second.");

    // The forward clamp pulls the first end back to the next start, bounded by its own start
    assert_eq!((segments[0].start, segments[0].end), (5.0, 5.0));
    assert_eq!((segments[1].start, segments[1].end), (3.0, 13.0));
    assert!(segments[1].start < segments[0].start);
}

/// Test that ordered markers never overlap
#[test]
fn test_parse_withOrderedMarkers_shouldNotOverlap() {
    let parser = NarrationSegmentParser::default();
    let raw = "[00:00] One.\n[00:04] Two.\n[00:20] Three.\n[00:22] Four.";
    let segments = parser.parse(raw, &[]);

    assert_eq!(segments.len(), 4);
    for pair in segments.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{} overlaps {}", pair[0], pair[1]);
    }
    assert_eq!(segments[1].end, 14.0);
    assert_eq!(segments[3].end, 32.0);
}

/// Test the configured span and fallback slot
#[test]
fn test_parse_withCustomSpans_shouldUseThem() {
    let parser = NarrationSegmentParser::new(4.0, 3.0);

    let marked = parser.parse("[00:10] Alone.", &[]);
    assert_eq!((marked[0].start, marked[0].end), (10.0, 14.0));

    let unmarked = parser.parse("a\nb\nc", &[]);
    assert_eq!(unmarked.iter().map(|s| s.start).collect::<Vec<_>>(), vec![0.0, 3.0, 6.0]);
}

/// Test multi-line marker text
#[test]
fn test_parse_withTextAcrossLines_shouldKeepItInOneSegment() {
    let parser = NarrationSegmentParser::default();
    let segments = parser.parse("Intro that is ignored.\n[00:02] Line one\ncontinues here.\n[00:09] Next.", &[]);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "Line one\ncontinues here.");
}

/// Test hour markers and the diagnostic for narration past the transcript
#[test]
fn test_parseWithDiagnostics_withHourMarker_shouldFlagPastTranscript() {
    let parser = NarrationSegmentParser::default();
    let reference = common::sequential_segments(3, 5.0);
    let (segments, diagnostics) = parser.parse_with_diagnostics("[00:01] Early.\n[01:00:00] An hour in.", &reference);

    assert_eq!(segments[1].start, 3600.0);
    assert_eq!(
        diagnostics,
        vec![Diagnostic::NarrationPastTranscript { index: 2, start: 3600.0, transcript_end: 15.0 }]
    );
}

/// Test template timestamps past 99 hours being read back as markers
#[test]
fn test_parse_withTemplateOverHundredHours_shouldKeepMarkerTimes() {
    let hour = 3600.0;
    let script = TemplateNarrator::render(&SubtitleAnalysis::default(), &NarrationRequest::default(), &[], 5.0 * 101.0 * hour);
    assert!(script.lines().nth(1).is_some_and(|line| line.starts_with("[101:00:00]")));

    let segments = NarrationSegmentParser::default().parse(&script, &[]);
    assert_eq!(segments.len(), 5);
    assert_eq!(segments[1].start, 101.0 * hour);
    assert_eq!(segments[4].start, 404.0 * hour);
}

/// Test blank narration
#[test]
fn test_parse_withBlankText_shouldReturnNoSegments() {
    let parser = NarrationSegmentParser::default();
    assert!(parser.parse("  \n\n ", &[]).is_empty());
}
