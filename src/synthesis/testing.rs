//! In-memory [`SpeechSynthesizer`] that replays a fixed script of responses.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::client::{AudioChunkStream, SpeechSynthesizer, VoiceInfo, VoiceProfile};
use super::SynthesisError;

/// One scripted reply to a `synthesize` call.
pub enum Reply {
    /// The call itself fails
    Fail(SynthesisError),
    /// The call succeeds and streams these items in order
    Stream(Vec<Result<Bytes, SynthesisError>>),
}

impl Reply {
    pub fn chunks(chunks: &[&[u8]]) -> Self {
        Reply::Stream(
            chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect(),
        )
    }

    pub fn timeout() -> Self {
        Reply::Fail(SynthesisError::Timeout("read timed out".to_string()))
    }

    pub fn status(status: u16) -> Self {
        Reply::Fail(SynthesisError::Status {
            status,
            body: String::new(),
        })
    }
}

pub struct ScriptedSynthesizer {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _profile: &VoiceProfile,
    ) -> Result<AudioChunkStream, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(SynthesisError::Transport("script exhausted".to_string())));

        match reply {
            Reply::Fail(err) => Err(err),
            Reply::Stream(items) => Ok(stream::iter(items).boxed()),
        }
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError> {
        Ok(vec![VoiceInfo {
            voice_id: "voice-123".to_string(),
            name: "Scripted".to_string(),
        }])
    }
}
