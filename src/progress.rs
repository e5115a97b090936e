//! Optional progress reporting shared by the pipeline stages.

use std::sync::Arc;

/// Callback receiving a fraction in `[0, 1]` and a short message
pub type ProgressCallback = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Invoke `callback` if present, clamping the fraction
pub fn report(callback: Option<&ProgressCallback>, fraction: f32, message: &str) {
    if let Some(callback) = callback {
        callback(fraction.clamp(0.0, 1.0), message);
    }
}
