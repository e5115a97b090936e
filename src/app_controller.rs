use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{ContentAnalyzer, SubtitleAnalysis};
use crate::app_config::Config;
use crate::diagnostics::Diagnostic;
use crate::errors::{AppError, HighlightError, SubtitleError};
use crate::file_utils::{FileManager, FileType};
use crate::highlights::frames::{analyze_frames, guided_timestamps, key_moments};
use crate::highlights::{FrameAnalysis, GuidedHighlightSelector, Highlight, KeyMoment};
use crate::narration::{BackendCascade, NarrationGenerator, NarrationRequest, NarrationResult};
use crate::progress::ProgressCallback;
use crate::providers::ernie::AccessTokenCache;
use crate::providers::qwen_vl::QwenVl;
use crate::providers::{build_generators, TextGenerator};
use crate::subtitle_processor::{SubtitleFormat, SubtitleParser, TimedSegment};
use crate::video::{probe_duration, FrameExtractor};

// @module: Application controller for the subtitle → narration → highlight pipeline

// @const: Suffix of the JSON report written next to each input
pub const REPORT_SUFFIX: &str = "narration";

/// Parsed subtitle track with its analysis
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleTrack {
    pub segments: Vec<TimedSegment>,
    pub analysis: SubtitleAnalysis,
    pub format: SubtitleFormat,
    pub encoding: &'static str,
    pub diagnostics: Vec<Diagnostic>,
}

/// Frames analyzed for one video
#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoAnalysis {
    pub duration: f64,
    pub frames: Vec<FrameAnalysis>,
    pub key_moments: Vec<KeyMoment>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub source: String,
    pub format: SubtitleFormat,
    pub encoding: &'static str,
    pub subtitle_segments: usize,
    pub analysis: SubtitleAnalysis,
    pub narration: NarrationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAnalysis>,
    pub highlights: Vec<Highlight>,
    /// Subtitle, narration and frame diagnostics in pipeline order
    pub diagnostics: Vec<Diagnostic>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Narration generator built from the configured cascade
    generator: NarrationGenerator,

    // @field: ERNIE token cache shared by every run of this controller
    token_cache: Arc<AccessTokenCache>,
}

impl Controller {
    // @method: Create a controller whose cascade comes from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let token_cache = Arc::new(AccessTokenCache::default());
        let backends = build_generators(
            &config.narration.providers,
            &config.narration.generation_settings(),
            &token_cache,
        );
        Ok(Self::assemble(config, backends, token_cache))
    }

    // @method: Create a controller over explicit backends, in priority order
    pub fn with_backends(config: Config, backends: Vec<Box<dyn TextGenerator>>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, backends, Arc::new(AccessTokenCache::default())))
    }

    fn assemble(config: Config, backends: Vec<Box<dyn TextGenerator>>, token_cache: Arc<AccessTokenCache>) -> Self {
        let cascade = BackendCascade::new(backends, Duration::from_secs(config.narration.timeout_secs));
        let generator = NarrationGenerator::new(cascade)
            .with_segment_parser(config.segments.parser())
            .with_segment_cap(config.narration.prompt_segment_cap)
            .with_language(config.narration.language.clone());
        Self { config, generator, token_cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token_cache(&self) -> &Arc<AccessTokenCache> {
        &self.token_cache
    }

    /// Parse subtitle bytes and analyze them; zero segments is `EmptyInput`
    pub fn parse_subtitle(&self, raw: &[u8], filename: &str) -> Result<SubtitleTrack, SubtitleError> {
        let parsed = SubtitleParser::parse(raw, filename)?;
        if parsed.segments.is_empty() {
            return Err(SubtitleError::EmptyInput(filename.to_string()));
        }

        let analysis = ContentAnalyzer::analyze(&parsed.segments);
        info!(
            "Parsed {} ({}, {}): {} segments, {} characters found",
            filename, parsed.format, parsed.encoding, parsed.segments.len(), analysis.characters.len()
        );

        Ok(SubtitleTrack {
            segments: parsed.segments,
            analysis,
            format: parsed.format,
            encoding: parsed.encoding,
            diagnostics: parsed.diagnostics,
        })
    }

    /// Generate narration; never fails
    pub async fn generate_narration(
        &self,
        segments: &[TimedSegment],
        analysis: &SubtitleAnalysis,
        request: &NarrationRequest,
        progress: Option<&ProgressCallback>,
    ) -> NarrationResult {
        self.generator.generate_reporting(segments, analysis, request, &[], progress).await
    }

    /// Select highlights from narration segments and analyzed frames.
    ///
    /// With a video duration, narration past the end of the video is dropped
    /// and reported, and no highlight runs past it.
    pub fn select_highlights(
        &self,
        narration_segments: &[TimedSegment],
        frames: &[FrameAnalysis],
        characters: &BTreeSet<String>,
        video_duration: Option<f64>,
    ) -> Result<(Vec<Highlight>, Vec<Diagnostic>), HighlightError> {
        GuidedHighlightSelector::new(self.config.highlights.selection())
            .with_characters(characters.clone())
            .with_video_duration(video_duration)
            .select_with_diagnostics(narration_segments, frames)
    }

    /// Sample and describe frames of `video_path` at the narration midpoints
    pub async fn analyze_video(&self, video_path: &Path, narration_segments: &[TimedSegment]) -> Result<VideoAnalysis> {
        let frames_config = &self.config.frames;
        let duration = probe_duration(video_path, Duration::from_secs(frames_config.probe_timeout_secs)).await?;
        let timestamps = guided_timestamps(narration_segments, duration);
        if timestamps.is_empty() {
            return Ok(VideoAnalysis { duration, ..VideoAnalysis::default() });
        }

        let work_dir = tempfile::tempdir().context("Failed to create frame work directory")?;
        let source = FrameExtractor::new(
            video_path,
            work_dir.path(),
            Duration::from_secs(frames_config.extract_timeout_secs),
        );
        let analyzer = QwenVl::new(
            &frames_config.vision_api_key,
            &frames_config.vision_endpoint,
            Duration::from_secs(frames_config.vision_timeout_secs),
        )
        .model(&frames_config.vision_model);

        info!("Analyzing {} frames of {:?}", timestamps.len(), video_path);
        let (frames, diagnostics) = analyze_frames(&source, &analyzer, &timestamps, frames_config.concurrency).await;
        let key_moments = key_moments(&frames);

        Ok(VideoAnalysis { duration, frames, key_moments, diagnostics })
    }

    /// Full pipeline over subtitle bytes and an optional video
    pub async fn run_pipeline(
        &self,
        raw: &[u8],
        filename: &str,
        video: Option<&Path>,
        request: &NarrationRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<PipelineReport, AppError> {
        let track = self.parse_subtitle(raw, filename)?;
        let narration = self.generate_narration(&track.segments, &track.analysis, request, progress).await;

        let mut diagnostics = track.diagnostics.clone();
        diagnostics.extend(narration.diagnostics.iter().cloned());

        let video_analysis = match video {
            Some(path) => match self.analyze_video(path, &narration.segments).await {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!("Video analysis skipped: {}", e);
                    diagnostics.push(Diagnostic::VideoAnalysisSkipped { reason: format!("{:#}", e) });
                    None
                }
            },
            None => None,
        };
        if let Some(video) = &video_analysis {
            diagnostics.extend(video.diagnostics.iter().cloned());
        }

        let frames = video_analysis.as_ref().map(|v| v.frames.as_slice()).unwrap_or_default();
        let duration = video_analysis.as_ref().map(|v| v.duration);
        let (highlights, selection_diagnostics) =
            self.select_highlights(&narration.segments, frames, &track.analysis.characters, duration)?;
        diagnostics.extend(selection_diagnostics);

        Ok(PipelineReport {
            source: filename.to_string(),
            format: track.format,
            encoding: track.encoding,
            subtitle_segments: track.segments.len(),
            analysis: track.analysis,
            narration,
            video: video_analysis,
            highlights,
            diagnostics,
        })
    }

    /// Run the pipeline on one subtitle file and write its JSON report
    pub async fn run(
        &self,
        input_file: PathBuf,
        video: Option<PathBuf>,
        request: &NarrationRequest,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, video.as_deref(), request, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        video: Option<&Path>,
        request: &NarrationRequest,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_dir = input_file.parent().map(Path::to_path_buf).unwrap_or_default();
        let output_path = FileManager::generate_output_path(input_file, &output_dir, REPORT_SUFFIX, "json");
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, report already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let raw = FileManager::read_bytes(input_file)?;
        let filename = input_file
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let callback: ProgressCallback = Arc::new(move |fraction: f32, message: &str| {
            pb.set_position((fraction * 100.0).round() as u64);
            pb.set_message(message.to_string());
        });

        let report = self
            .run_pipeline(&raw, &filename, video, request, Some(&callback))
            .await
            .map_err(|e| anyhow!("{}: {}", filename, e));
        progress_bar.finish_and_clear();
        let report = report?;

        for diagnostic in &report.diagnostics {
            warn!("{}", diagnostic);
        }

        let json = serde_json::to_string_pretty(&report).context("Failed to serialize pipeline report")?;
        FileManager::write_to_file(&output_path, &json)?;

        info!(
            "Success: {} ({} narration segments via {}, {} highlights) in {}",
            output_path.display(),
            report.narration.metadata.segment_count,
            report.narration.metadata.service_used,
            report.highlights.len(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(Some(output_path))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the pipeline on every subtitle file under `input_dir`.
    ///
    /// A video with the same stem next to a subtitle file is used for
    /// guided frame analysis.
    pub async fn run_folder(&self, input_dir: PathBuf, request: &NarrationRequest, force_overwrite: bool) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let subtitle_files = FileManager::find_subtitle_files(&input_dir)?;
        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for subtitle_file in &subtitle_files {
            let file_name = subtitle_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let video = Self::sibling_video(subtitle_file);
            match self
                .run_with_progress(subtitle_file, video.as_deref(), request, &multi_progress, force_overwrite)
                .await
            {
                Ok(Some(_)) => success_count += 1,
                Ok(None) => skip_count += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            success_count, skip_count, error_count, Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    // @returns: First video file sharing the subtitle's stem, if any
    fn sibling_video(subtitle_file: &Path) -> Option<PathBuf> {
        ["mp4", "mkv", "mov", "avi", "webm"]
            .iter()
            .map(|ext| subtitle_file.with_extension(ext))
            .find(|candidate| candidate.exists() && FileManager::detect_file_type(candidate) == FileType::Video)
    }
}
