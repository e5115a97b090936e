// @module: ffprobe and ffmpeg adapters for guided frame analysis

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use tokio::process::Command;

use crate::highlights::frames::FrameSource;

// @const: Default ffprobe timeout
pub const PROBE_TIMEOUT_SECS: u64 = 60;

// @const: Default per-frame ffmpeg timeout
pub const EXTRACT_TIMEOUT_SECS: u64 = 30;

// @returns: Video duration in seconds from ffprobe's format section
pub async fn probe_duration(video_path: &Path, timeout: Duration) -> Result<f64> {
    if !video_path.exists() {
        return Err(anyhow!("Video file not found: {:?}", video_path));
    }

    let ffprobe_future = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            video_path.to_str().unwrap_or_default(),
        ])
        .output();

    let output = tokio::select! {
        result = ffprobe_future => {
            result.map_err(|e| anyhow!("Failed to execute ffprobe command: {}", e))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(anyhow!("ffprobe command timed out after {} seconds", timeout.as_secs()));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("ffprobe failed: {}", stderr);
        return Err(anyhow!("ffprobe command failed: {}", stderr));
    }

    let json: Value = serde_json::from_slice(&output.stdout)
        .context("Failed to parse ffprobe JSON output")?;
    parse_probe_duration(&json)
}

// @returns: format.duration, which ffprobe reports as a string
fn parse_probe_duration(json: &Value) -> Result<f64> {
    json.get("format")
        .and_then(|format| format.get("duration"))
        .and_then(|duration| match duration {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| anyhow!("ffprobe output has no usable duration"))
}

// @struct: Writes single JPEG frames of one video into a work directory
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    // @field: Source video
    video_path: PathBuf,

    // @field: Directory receiving frame_<ms>.jpg files
    work_dir: PathBuf,

    // @field: Per-frame ffmpeg timeout
    timeout: Duration,
}

impl FrameExtractor {
    pub fn new(video_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            video_path: video_path.into(),
            work_dir: work_dir.into(),
            timeout,
        }
    }

    // @returns: Output path for the frame at `timestamp`
    pub fn frame_path(&self, timestamp: f64) -> PathBuf {
        let millis = (timestamp.max(0.0) * 1000.0).round() as u64;
        self.work_dir.join(format!("frame_{:08}.jpg", millis))
    }
}

#[async_trait]
impl FrameSource for FrameExtractor {
    async fn extract_frame(&self, timestamp: f64) -> Result<PathBuf> {
        let output_path = self.frame_path(timestamp);
        let seek = format!("{:.3}", timestamp.max(0.0));

        let ffmpeg_future = Command::new("ffmpeg")
            .args([
                "-y",
                "-ss", seek.as_str(),
                "-i", self.video_path.to_str().unwrap_or_default(),
                "-frames:v", "1",
                "-q:v", "2",
                output_path.to_str().unwrap_or_default(),
            ])
            .output();

        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| anyhow!("Failed to execute ffmpeg command for frame extraction: {}", e))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(anyhow!("ffmpeg command timed out after {} seconds", self.timeout.as_secs()));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Frame extraction failed: {}", filtered);
            return Err(anyhow!("ffmpeg extraction failed: {}", filtered));
        }

        let file_size = tokio::fs::metadata(&output_path).await.map(|m| m.len()).unwrap_or(0);
        if file_size == 0 {
            return Err(anyhow!("No frame written at {:.1}s", timestamp));
        }

        debug!("Extracted frame at {:.1}s to {:?}", timestamp, output_path);
        Ok(output_path)
    }
}

// @returns: ffmpeg stderr without the banner and stream listing
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: [&str; 10] = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error".to_string()
    } else {
        meaningful.join("\n")
    }
}
