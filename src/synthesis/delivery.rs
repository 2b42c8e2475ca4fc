//! # Resilient Delivery
//!
//! Delivers one line of text to one output file.
//!
//! ## Per-attempt Pipeline:
//! 1. **Synthesize**: call the [`SpeechSynthesizer`] and drain its chunk stream
//! 2. **Assemble**: concatenate non-empty chunks in arrival order
//! 3. **Frame**: prepend a WAVE header when the format is headerless
//! 4. **Persist**: write to a temp file in the target directory, then rename
//!
//! Retryable failures are retried after a fixed delay until the attempts run
//! out. A failed attempt never leaves a file behind, complete or partial.

use futures_util::StreamExt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use super::client::{AudioChunkStream, SpeechSynthesizer, VoiceProfile};
use super::SynthesisError;
use crate::audio::format::OutputFormat;
use crate::audio::wav::{self, HeaderError};

/// How many times to try a delivery and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub attempts: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Every attempt failed with a retryable error
    #[error("All {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: SynthesisError },

    /// The service refused the request in a way retrying will not fix
    #[error("Request rejected: {0}")]
    Rejected(SynthesisError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub path: PathBuf,
    /// Bytes written, header included
    pub bytes_written: usize,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Delivers text to audio files through an injected synthesizer.
pub struct Delivery<S> {
    synthesizer: S,
    profile: VoiceProfile,
    retry: RetryPolicy,
}

impl<S: SpeechSynthesizer> Delivery<S> {
    pub fn new(synthesizer: S, profile: VoiceProfile, retry: RetryPolicy) -> Self {
        Self {
            synthesizer,
            profile,
            retry,
        }
    }

    #[cfg(test)]
    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Synthesize `text` and write the resulting audio file to `destination`.
    ///
    /// ## Returns:
    /// - **Ok(DeliveryReceipt)**: the file is complete at `destination`
    /// - **Err(Exhausted)**: every attempt hit a transient failure
    /// - **Err(Rejected)**: the service refused the request outright
    /// - **Err(Header | Io)**: the audio could not be framed or written
    ///
    /// On any error nothing is left at `destination`.
    pub async fn deliver(
        &self,
        text: &str,
        destination: &Path,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_audio(text).await {
                Ok(audio) => {
                    let file = render(audio, self.profile.output_format)?;
                    persist_atomically(destination, &file).map_err(|source| DeliveryError::Io {
                        path: destination.to_path_buf(),
                        source,
                    })?;

                    info!("A new audio file was saved successfully at {}", destination.display());
                    return Ok(DeliveryReceipt {
                        path: destination.to_path_buf(),
                        bytes_written: file.len(),
                        attempts: attempt,
                    });
                }
                Err(err) if !err.is_retryable() => {
                    warn!(attempt, error = %err, "Request rejected, not retrying");
                    return Err(DeliveryError::Rejected(err));
                }
                Err(err) => {
                    warn!("Attempt {}/{} failed: {}", attempt, attempts, err);
                    if attempt >= attempts {
                        return Err(DeliveryError::Exhausted { attempts, last: err });
                    }

                    info!("Retrying in {} seconds...", self.retry.delay.as_secs_f64());
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One round trip: request, then drain the whole body.
    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let stream = self.synthesizer.synthesize(text, &self.profile).await?;
        collect_chunks(stream).await
    }
}

/// Concatenate every non-empty chunk of `stream` in arrival order.
///
/// The first error aborts collection and the partial buffer is dropped.
pub async fn collect_chunks(mut stream: AudioChunkStream) -> Result<Vec<u8>, SynthesisError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if !chunk.is_empty() {
            buffer.extend_from_slice(&chunk);
        }
    }
    Ok(buffer)
}

/// Frame raw audio for `format`, adding a WAVE header when it has none.
pub fn render(audio: Vec<u8>, format: OutputFormat) -> Result<Vec<u8>, HeaderError> {
    match format.descriptor() {
        Some(descriptor) => wav::wrap(audio, &descriptor),
        None => Ok(audio),
    }
}

/// Write `contents` to `path` so that readers only ever see a complete file.
///
/// The data goes to a temp file in the same directory, which is renamed over
/// `path` once flushed.
pub fn persist_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
