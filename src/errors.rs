/*!
 * Error types for the captionkit library.
 *
 * Every failure surfaced to callers carries enough structure (kind plus the
 * offending field, provider or cause) to be handled programmatically.
 */

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::providers::TranscriptionService;

/// Errors that can occur when talking to a transcription provider
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

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider accepted the job but reported it as failed
    #[error("Transcription job failed: {0}")]
    JobFailed(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and body to the matching error variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// A single offending field found while validating a caption style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleViolation {
    /// Name of the configuration field
    pub field: &'static str,
    /// Human readable reason
    pub message: String,
}

impl StyleViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for StyleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[StyleViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable, payload-free classification of a [`CaptionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    InvalidStyle,
    UnknownPreset,
    InternalInvariant,
    InvariantViolation,
    Transcription,
    Render,
    Timeout,
    NotFound,
    Config,
    Io,
}

/// Main library error type
#[derive(Error, Debug)]
pub enum CaptionError {
    /// Malformed SRT input
    #[error("Malformed SRT at line {line}: {message}")]
    Format {
        /// 1-based line number where the problem was detected
        line: usize,
        message: String,
    },

    /// One or more style fields failed validation
    #[error("Invalid caption style: {}", join_violations(.violations))]
    InvalidStyle { violations: Vec<StyleViolation> },

    /// Requested style preset does not exist
    #[error("Unknown style preset: {0}")]
    UnknownPreset(String),

    /// A value that validation should have rejected reached an inner layer
    #[error("Internal invariant broken: {0}")]
    InternalInvariant(String),

    /// Animation expansion produced windows that do not tile the cue
    #[error("Render instructions for cue {cue_index} violate window invariant: {message}")]
    InvariantViolation { cue_index: usize, message: String },

    /// Transcription provider failure
    #[error("Transcription with {provider} failed: {cause}")]
    Transcription {
        provider: TranscriptionService,
        #[source]
        cause: ProviderError,
    },

    /// External renderer failure
    #[error("Rendering failed: {cause}")]
    Render { cause: String },

    /// A caller supplied deadline expired
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Required input file is missing
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } => ErrorKind::Format,
            Self::InvalidStyle { .. } => ErrorKind::InvalidStyle,
            Self::UnknownPreset(_) => ErrorKind::UnknownPreset,
            Self::InternalInvariant(_) => ErrorKind::InternalInvariant,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::Transcription { .. } => ErrorKind::Transcription,
            Self::Render { .. } => ErrorKind::Render,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Names of the offending style fields, empty for other kinds
    pub fn style_fields(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidStyle { violations } => violations.iter().map(|v| v.field).collect(),
            _ => Vec::new(),
        }
    }
}

/// Convenience alias used across the library
pub type Result<T> = std::result::Result<T, CaptionError>;
