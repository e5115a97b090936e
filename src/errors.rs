/*!
 * Error types for the subnarrate pipeline.
 *
 * Each stage owns its error enum. Only the variants that mean "the caller
 * handed us unusable input" ever leave the library; transient backend
 * failures are absorbed by the narration cascade and surface as diagnostics.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication (missing or rejected credentials)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider did not answer within the per-call budget
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors that can occur while decoding or parsing a subtitle track
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The extension or content is not one of the supported dialects
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// Non-empty input could not be decoded to any text
    #[error("Failed to decode subtitle bytes: {0}")]
    Encoding(String),

    /// Parsing produced zero usable segments
    #[error("No usable subtitle segments found in {0}")]
    EmptyInput(String),
}

/// Errors raised inside the narration cascade
#[derive(Error, Debug)]
pub enum NarrationError {
    /// Every configured backend failed or answered with an empty string
    #[error("All {attempts} narration backends failed")]
    AllBackendsFailed {
        /// How many backends were attempted
        attempts: usize,
    },

    /// The narration request violates its own invariants
    #[error("Invalid narration request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur during highlight selection
#[derive(Error, Debug)]
pub enum HighlightError {
    /// Selection was invoked without any narration segment
    #[error("No highlight candidates: narration has no segments")]
    NoCandidates,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from narration generation
    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),

    /// Error from highlight selection
    #[error("Highlight error: {0}")]
    Highlight(#[from] HighlightError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
