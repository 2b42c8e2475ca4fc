//! # Speech Synthesis
//!
//! Talks to the remote text-to-speech service and turns its responses into
//! audio files on disk.
//!
//! ## Key Components:
//! - **Client**: The [`SpeechSynthesizer`] seam and its HTTP implementation
//! - **Delivery**: Buffer assembly, container framing, atomic writes and retries
//!
//! ## Error Classification:
//! Every failure of the remote call is a [`SynthesisError`]. Timeouts,
//! transport failures, interrupted streams, 429 and 5xx responses are
//! retryable. Other 4xx responses (bad key, unknown voice), requests that
//! could not be built and undecodable bodies are not.

pub mod client;     // Remote service seam and HTTP client
pub mod delivery;   // Retrying delivery of one line to one file

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ElevenLabsClient, SpeechSynthesizer, VoiceProfile, VoiceSettings};
pub use delivery::{Delivery, DeliveryError, RetryPolicy};

use thiserror::Error;

/// Failure of a single call to the synthesis service.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    Transport(String),

    /// The request itself is malformed (bad URL, illegal header value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode service response: {0}")]
    Decode(String),

    #[error("Audio stream interrupted: {0}")]
    Stream(String),
}

impl SynthesisError {
    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesisError::Timeout(_)
            | SynthesisError::Transport(_)
            | SynthesisError::Stream(_) => true,
            SynthesisError::Status { status, .. } => *status == 429 || *status >= 500,
            SynthesisError::InvalidRequest(_) | SynthesisError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SynthesisError::Timeout(err.to_string())
        } else if err.is_builder() {
            SynthesisError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            SynthesisError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SynthesisError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SynthesisError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> SynthesisError {
        SynthesisError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(SynthesisError::Timeout("read timeout".into()).is_retryable());
        assert!(SynthesisError::Transport("connection reset".into()).is_retryable());
        assert!(SynthesisError::Stream("eof".into()).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
    }

    #[test]
    fn test_client_errors_are_fatal() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(422).is_retryable());
        assert!(!SynthesisError::Decode("bad json".into()).is_retryable());
        assert!(!SynthesisError::InvalidRequest("relative URL without a base".into()).is_retryable());
    }

    #[test]
    fn test_builder_errors_are_fatal() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert!(err.is_builder());

        let err = SynthesisError::from(err);
        assert!(matches!(err, SynthesisError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }
}
