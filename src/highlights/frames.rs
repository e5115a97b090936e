/*!
 * Video frame analysis feeding highlight selection.
 *
 * Frames are sampled at narration segment midpoints, extracted by a
 * [`FrameSource`] and described by a [`FrameAnalyzer`]. Analyses run with a
 * bounded fan-out and come back sorted by timestamp; a frame that cannot be
 * extracted or described becomes a diagnostic instead of an error.
 */

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::errors::ProviderError;
use crate::subtitle_processor::TimedSegment;

/// Frames above this confidence become key moments
pub const KEY_MOMENT_CONFIDENCE: f64 = 0.7;

/// Maximum number of key moments kept
pub const MAX_KEY_MOMENTS: usize = 10;

/// Description of one video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub timestamp: f64,
    pub description: String,
    pub confidence: f64,
}

/// A frame described with high confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    pub timestamp: f64,
    pub description: String,
    pub confidence: f64,
}

/// Describes an extracted frame image
#[async_trait]
pub trait FrameAnalyzer: Send + Sync + Debug {
    async fn analyze_frame(&self, image_path: &Path, timestamp: f64) -> Result<FrameAnalysis, ProviderError>;
}

/// Produces a frame image for a timestamp
#[async_trait]
pub trait FrameSource: Send + Sync + Debug {
    async fn extract_frame(&self, timestamp: f64) -> anyhow::Result<PathBuf>;
}

/// Sampling points for guided analysis: segment midpoints inside the video.
///
/// A non-positive `duration` means the length is unknown and nothing is
/// filtered. Points are sorted and deduplicated.
pub fn guided_timestamps(segments: &[TimedSegment], duration: f64) -> Vec<f64> {
    let mut points: Vec<f64> = segments
        .iter()
        .map(TimedSegment::midpoint)
        .filter(|t| duration <= 0.0 || *t < duration)
        .collect();
    points.sort_by(f64::total_cmp);
    points.dedup();
    points
}

/// Frame closest in time to `timestamp`
pub fn nearest_frame(frames: &[FrameAnalysis], timestamp: f64) -> Option<&FrameAnalysis> {
    frames
        .iter()
        .min_by(|a, b| (a.timestamp - timestamp).abs().total_cmp(&(b.timestamp - timestamp).abs()))
}

/// High-confidence frames, most confident first
pub fn key_moments(frames: &[FrameAnalysis]) -> Vec<KeyMoment> {
    let mut moments: Vec<KeyMoment> = frames
        .iter()
        .filter(|frame| frame.confidence > KEY_MOMENT_CONFIDENCE)
        .map(|frame| KeyMoment {
            timestamp: frame.timestamp,
            description: frame.description.clone(),
            confidence: frame.confidence,
        })
        .collect();
    moments.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    moments.truncate(MAX_KEY_MOMENTS);
    moments
}

/// Extract and describe a frame at each timestamp, at most `concurrency` at a time
pub async fn analyze_frames(
    source: &dyn FrameSource,
    analyzer: &dyn FrameAnalyzer,
    timestamps: &[f64],
    concurrency: usize,
) -> (Vec<FrameAnalysis>, Vec<Diagnostic>) {
    let results = stream::iter(timestamps.iter().copied())
        .map(|timestamp| async move {
            let outcome = match source.extract_frame(timestamp).await {
                Ok(path) => analyzer.analyze_frame(&path, timestamp).await.map_err(|e| e.to_string()),
                Err(e) => Err(format!("frame extraction failed: {}", e)),
            };
            (timestamp, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut frames = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (timestamp, outcome) in results {
        match outcome {
            Ok(frame) => {
                debug!("Frame at {:.1}s: {}", timestamp, frame.description);
                frames.push(frame);
            }
            Err(reason) => {
                warn!("Frame at {:.1}s failed: {}", timestamp, reason);
                diagnostics.push(Diagnostic::FrameFailed { timestamp, reason });
            }
        }
    }

    frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    diagnostics.sort_by(|a, b| match (a, b) {
        (Diagnostic::FrameFailed { timestamp: x, .. }, Diagnostic::FrameFailed { timestamp: y, .. }) => x.total_cmp(y),
        _ => std::cmp::Ordering::Equal,
    });
    (frames, diagnostics)
}
