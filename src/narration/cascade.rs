/*!
 * Sequential backend cascade.
 *
 * Backends are tried strictly one after another in priority order. Each call
 * runs under its own timeout; an error, a timeout or a blank answer counts as
 * a failure, is recorded as a diagnostic, and the next backend is tried. The
 * first non-blank answer wins and no later backend is called.
 */

use std::time::Duration;

use log::{info, warn};

use crate::diagnostics::Diagnostic;
use crate::errors::{NarrationError, ProviderError};
use crate::providers::TextGenerator;

/// Text produced by the winning backend
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    /// Name of the backend that answered
    pub provider: String,
    /// Its answer, trimmed
    pub text: String,
}

/// Result of running the cascade once
#[derive(Debug)]
pub struct CascadeOutcome {
    /// The winning answer, or `AllBackendsFailed`
    pub result: Result<GeneratedText, NarrationError>,
    /// One entry per failed backend, in attempt order
    pub diagnostics: Vec<Diagnostic>,
}

/// Ordered list of backends with a per-call timeout
#[derive(Debug)]
pub struct BackendCascade {
    backends: Vec<Box<dyn TextGenerator>>,
    call_timeout: Duration,
}

impl BackendCascade {
    /// Create a cascade; `backends` order is the priority order
    pub fn new(backends: Vec<Box<dyn TextGenerator>>, call_timeout: Duration) -> Self {
        Self { backends, call_timeout }
    }

    /// Number of configured backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True when no backend is configured
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backend names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try each backend in turn until one returns non-blank text
    pub async fn run(&self, prompt: &str) -> CascadeOutcome {
        let mut diagnostics = Vec::new();

        for backend in &self.backends {
            info!("Trying {} for narration", backend.name());

            let attempt = tokio::time::timeout(self.call_timeout, backend.generate(prompt))
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(self.call_timeout.as_secs())));

            let reason = match attempt {
                Ok(text) if !text.trim().is_empty() => {
                    info!("Narration generated by {}", backend.name());
                    return CascadeOutcome {
                        result: Ok(GeneratedText {
                            provider: backend.name().to_string(),
                            text: text.trim().to_string(),
                        }),
                        diagnostics,
                    };
                }
                Ok(_) => "empty response".to_string(),
                Err(e) => e.to_string(),
            };

            warn!("{} failed to generate narration: {}", backend.name(), reason);
            diagnostics.push(Diagnostic::ProviderFailed {
                provider: backend.name().to_string(),
                reason,
            });
        }

        CascadeOutcome {
            result: Err(NarrationError::AllBackendsFailed { attempts: self.backends.len() }),
            diagnostics,
        }
    }
}
