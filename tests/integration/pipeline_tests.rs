/*!
 * End-to-end tests of subtitle parsing, narration and highlight selection
 */

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use subnarrate::analysis::ContentAnalyzer;
use subnarrate::app_config::Config;
use subnarrate::app_controller::Controller;
use subnarrate::diagnostics::Diagnostic;
use subnarrate::errors::{AppError, SubtitleError};
use subnarrate::highlights::KeyMoment;
use subnarrate::narration::{
    BackendCascade, NarrationGenerator, NarrationMode, NarrationRequest, NarrationStyle, TargetAudience,
    TEMPLATE_SERVICE,
};
use subnarrate::progress::ProgressCallback;
use subnarrate::providers::TextGenerator;
use subnarrate::subtitle_processor::SubtitleParser;
use crate::common;
use crate::common::mock_providers::MockProvider;

fn controller(backends: Vec<Box<dyn TextGenerator>>) -> Result<Controller> {
    Controller::with_backends(Config::default(), backends)
}

/// Test the template fallback when all three backends throw
#[tokio::test]
async fn test_generate_narration_withThreeFailingBackends_shouldUseTemplate() -> Result<()> {
    common::init_test_logging();
    let parsed = SubtitleParser::parse(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;
    let analysis = ContentAnalyzer::analyze(&parsed.segments);
    let generator = NarrationGenerator::new(BackendCascade::new(
        vec![MockProvider::failing().boxed(), MockProvider::failing().boxed(), MockProvider::failing().boxed()],
        Duration::from_secs(5),
    ));

    let request = NarrationRequest::third_person(NarrationStyle::Dramatic, TargetAudience::General);
    let result = generator.generate(&parsed.segments, &analysis, &request).await;

    assert_eq!(result.metadata.service_used, TEMPLATE_SERVICE);
    assert!(result.used_template());
    assert!(result.segments.len() >= 3);
    assert!(result.segments.iter().all(|s| !s.text.trim().is_empty()));
    assert_eq!(result.metadata.segment_count, result.segments.len());

    let failures = result
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::ProviderFailed { .. }))
        .count();
    assert_eq!(failures, 3);
    assert!(result.diagnostics.contains(&Diagnostic::TemplateFallback { attempts: 3 }));
    Ok(())
}

/// Test the template fallback using key moments as markers
#[tokio::test]
async fn test_generate_with_moments_withNoBackends_shouldMentionKeyMoments() -> Result<()> {
    let parsed = SubtitleParser::parse(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;
    let analysis = ContentAnalyzer::analyze(&parsed.segments);
    let generator = NarrationGenerator::new(BackendCascade::new(Vec::new(), Duration::from_secs(1)));
    let moments = vec![KeyMoment { timestamp: 7.0, description: "A door bursts open".to_string(), confidence: 0.9 }];

    let result = generator
        .generate_with_moments(&parsed.segments, &analysis, &NarrationRequest::default(), &moments)
        .await;

    assert!(result.used_template());
    assert!(result.raw_text.contains("A door bursts open"));
    Ok(())
}

/// Test metadata from a working backend
#[tokio::test]
async fn test_generate_narration_withWorkingBackend_shouldFillMetadata() -> Result<()> {
    let controller = controller(vec![MockProvider::failing().boxed(), MockProvider::working().boxed()])?;
    let track = controller.parse_subtitle(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;

    let request = NarrationRequest::character("Anna", NarrationStyle::Emotional, TargetAudience::Young);
    let result = controller.generate_narration(&track.segments, &track.analysis, &request, None).await;

    assert_eq!(result.metadata.service_used, "MockWorking");
    assert_eq!(result.metadata.mode, NarrationMode::Character);
    assert_eq!(result.metadata.character_name.as_deref(), Some("Anna"));
    assert_eq!(result.metadata.segment_count, 4);
    assert_eq!(result.metadata.char_count, result.raw_text.chars().count());
    assert_eq!(result.metadata.estimated_speech_secs, result.metadata.char_count as f64 * 0.5);
    assert_eq!(result.segments[1].start, 4.0);
    Ok(())
}

/// Test that a character request without a name is downgraded
#[tokio::test]
async fn test_generate_narration_withNamelessCharacter_shouldDowngrade() -> Result<()> {
    let controller = controller(vec![MockProvider::working().boxed()])?;
    let track = controller.parse_subtitle(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;

    let request = NarrationRequest::character("   ", NarrationStyle::Casual, TargetAudience::General);
    let result = controller.generate_narration(&track.segments, &track.analysis, &request, None).await;

    assert_eq!(result.metadata.mode, NarrationMode::ThirdPerson);
    assert!(result.metadata.character_name.is_none());
    assert!(matches!(result.diagnostics.first(), Some(Diagnostic::RequestDowngraded { .. })));
    Ok(())
}

/// Test the full pipeline without a video
#[tokio::test]
async fn test_run_pipeline_withWorkingBackend_shouldProduceHighlights() -> Result<()> {
    common::init_test_logging();
    let provider = MockProvider::working();
    let calls = provider.call_counter();
    let controller = controller(vec![provider.boxed()])?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress: ProgressCallback = Arc::new(move |fraction: f32, _message: &str| sink.lock().push(fraction));

    let report = controller
        .run_pipeline(
            common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(),
            "scene.srt",
            None,
            &NarrationRequest::default(),
            Some(&progress),
        )
        .await?;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.subtitle_segments, 4);
    assert!(report.video.is_none());
    assert_eq!(report.highlights.len(), 4);
    assert!(report.highlights.windows(2).all(|pair| pair[0].start <= pair[1].start));
    assert!(matches!(report.diagnostics.first(), Some(Diagnostic::DroppedBlock { block: 3, .. })));
    assert_eq!(seen.lock().first().copied(), Some(0.0));
    assert_eq!(seen.lock().last().copied(), Some(1.0));
    Ok(())
}

/// Test the full pipeline with every backend failing
#[tokio::test]
async fn test_run_pipeline_withFailingBackends_shouldStillSelectHighlights() -> Result<()> {
    let controller = controller(vec![MockProvider::failing().boxed(), MockProvider::empty().boxed()])?;

    let report = controller
        .run_pipeline(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt", None, &NarrationRequest::default(), None)
        .await?;

    assert!(report.narration.used_template());
    assert!((3..=6).contains(&report.highlights.len()));
    Ok(())
}

/// Test input that yields no segments
#[tokio::test]
async fn test_run_pipeline_withOnlyMalformedBlocks_shouldFailWithEmptyInput() -> Result<()> {
    let controller = controller(vec![MockProvider::working().boxed()])?;
    let result = controller
        .run_pipeline(b"1\nnot a timing line\ntext\n", "broken.srt", None, &NarrationRequest::default(), None)
        .await;

    assert!(matches!(result, Err(AppError::Subtitle(SubtitleError::EmptyInput(_)))));
    Ok(())
}

/// Test a missing video being skipped
#[tokio::test]
async fn test_run_pipeline_withMissingVideo_shouldContinueWithoutFrames() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(vec![MockProvider::working().boxed()])?;

    let report = controller
        .run_pipeline(
            common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(),
            "scene.srt",
            Some(&temp_dir.path().join("missing.mp4")),
            &NarrationRequest::default(),
            None,
        )
        .await?;

    assert!(report.video.is_none());
    assert!(report.highlights.iter().all(|h| h.description.is_empty()));
    assert!(report.diagnostics.iter().any(|d| matches!(d, Diagnostic::VideoAnalysisSkipped { .. })));
    Ok(())
}

/// Test narration trimmed to a video shorter than the transcript
#[tokio::test]
async fn test_select_highlights_withShortVideo_shouldStayInsideIt() -> Result<()> {
    let controller = controller(vec![MockProvider::working().boxed()])?;
    let track = controller.parse_subtitle(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;
    let narration = controller
        .generate_narration(&track.segments, &track.analysis, &NarrationRequest::default(), None)
        .await;
    let video_duration = narration.segments[2].start;

    let (highlights, diagnostics) =
        controller.select_highlights(&narration.segments, &[], &track.analysis.characters, Some(video_duration))?;

    assert!(!highlights.is_empty());
    assert!(highlights.iter().all(|h| h.start < video_duration && h.end <= video_duration));
    let dropped = diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::NarrationPastVideo { .. }))
        .count();
    assert_eq!(dropped, narration.segments.len() - 2);
    Ok(())
}
