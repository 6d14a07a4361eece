//! Feedback error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Mail delivery error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Feedback error: {} at {}:{}", message, file, line)]
pub struct FeedbackError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl FeedbackError {
    /// Creates a new feedback error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for FeedbackError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for FeedbackError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

/// A submission the relay refuses before any mail is sent.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SubmissionError {
    /// The message is empty or whitespace.
    #[display("Message is required.")]
    MissingMessage,

    /// The screenshot exceeds the size limit.
    #[display("Screenshot is too large ({} bytes, limit {}).", size, limit)]
    ScreenshotTooLarge {
        /// Bytes received.
        size: usize,
        /// Bytes allowed.
        limit: usize,
    },

    /// The request body could not be read as a form.
    #[display("Malformed form: {}", _0)]
    MalformedForm(#[error(not(source))] String),
}
