//! # Synthesis Client
//!
//! The [`SpeechSynthesizer`] trait is the only way the rest of the
//! application reaches the remote service. [`ElevenLabsClient`] implements it
//! over the ElevenLabs HTTP API; tests substitute a scripted implementation.
//!
//! ## Remote Contract:
//! - `POST {api_url}/text-to-speech/{voice_id}/stream?output_format=<fmt>`
//!   with a JSON body `{text, model_id, voice_settings}`, answered by a
//!   streamed audio body
//! - `GET {api_url}/voices`, answered by `{"voices": [{"voice_id", "name"}, ...]}`

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::SynthesisError;
use crate::audio::format::OutputFormat;

/// Stream of audio chunks in arrival order.
pub type AudioChunkStream = BoxStream<'static, Result<Bytes, SynthesisError>>;

/// Voice tuning parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice stability (0.0 to 1.0)
    pub stability: f32,
    /// Similarity boost (0.0 to 1.0)
    pub similarity_boost: f32,
    /// Style exaggeration (0.0 to 1.0)
    pub style: f32,
    /// Boost similarity to the original speaker
    pub use_speaker_boost: bool,
    /// Speaking rate multiplier
    pub speed: f32,
}

/// Everything except the text that identifies what to synthesize.
#[derive(Debug, Clone)]
pub struct VoiceProfile {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: OutputFormat,
    pub settings: VoiceSettings,
}

/// A voice available to the configured account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceInfo>,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Start synthesizing `text` and return the response body as a chunk stream.
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<AudioChunkStream, SynthesisError>;

    /// List the voices the account can use.
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError>;
}

/// HTTP client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ElevenLabsClient {
    /// Create a client for `api_url` (e.g. `https://api.elevenlabs.io/v1`).
    ///
    /// `timeout` bounds each whole request, including reading the body.
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SynthesisError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build the streaming synthesis request for `text`.
    fn build_synthesis_request(&self, text: &str, profile: &VoiceProfile) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/text-to-speech/{}/stream?output_format={}",
            self.api_url,
            profile.voice_id,
            profile.output_format.as_str()
        );

        let body = json!({
            "text": text,
            "model_id": profile.model_id,
            "voice_settings": profile.settings,
        });

        self.http
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", profile.output_format.mime_type())
            .json(&body)
    }

    fn build_voices_request(&self) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/voices", self.api_url))
            .header("xi-api-key", &self.api_key)
    }
}

/// Turn a non-success response into a [`SynthesisError::Status`].
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SynthesisError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<AudioChunkStream, SynthesisError> {
        debug!(
            voice_id = %profile.voice_id,
            model_id = %profile.model_id,
            output_format = %profile.output_format,
            chars = text.chars().count(),
            "Requesting speech synthesis"
        );

        let response = self.build_synthesis_request(text, profile).send().await?;
        let response = error_for_status(response).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout(e.to_string())
                } else {
                    SynthesisError::Stream(e.to_string())
                }
            })
        });

        Ok(stream.boxed())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError> {
        let response = self.build_voices_request().send().await?;
        let response = error_for_status(response).await?;
        let voices: VoicesResponse = response.json().await?;
        Ok(voices.voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(format: OutputFormat) -> VoiceProfile {
        VoiceProfile {
            voice_id: "voice-123".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: format,
            settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.0,
                use_speaker_boost: true,
                speed: 1.0,
            },
        }
    }

    fn client() -> ElevenLabsClient {
        ElevenLabsClient::new("https://api.example.test/v1/", "sk-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_synthesis_request_shape() {
        let request = client()
            .build_synthesis_request("Hello there.", &profile(OutputFormat::Ulaw8000))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.test/v1/text-to-speech/voice-123/stream?output_format=ulaw_8000"
        );
        assert_eq!(request.headers()["xi-api-key"], "sk-test");
        assert_eq!(request.headers()["accept"], "audio/basic");

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["text"], "Hello there.");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }

    #[test]
    fn test_accept_header_follows_format() {
        let request = client()
            .build_synthesis_request("hi", &profile(OutputFormat::Mp3_44100))
            .build()
            .unwrap();
        assert_eq!(request.headers()["accept"], "audio/mpeg");

        let request = client()
            .build_synthesis_request("hi", &profile(OutputFormat::Pcm16000))
            .build()
            .unwrap();
        assert_eq!(request.headers()["accept"], "audio/pcm");
    }

    #[test]
    fn test_voices_request() {
        let request = client().build_voices_request().build().unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "https://api.example.test/v1/voices");
    }

    #[tokio::test]
    async fn test_illegal_header_value_is_rejected_before_sending() {
        let client =
            ElevenLabsClient::new("https://api.example.test/v1", "sk-test\n", Duration::from_secs(5))
                .unwrap();

        let err = match client.synthesize("hi", &profile(OutputFormat::Mp3_44100)).await {
            Err(err) => err,
            Ok(_) => panic!("request with a newline in a header should not be sent"),
        };
        assert!(matches!(err, SynthesisError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_voices_response_parsing() {
        let json = r#"{"voices": [
            {"voice_id": "abc", "name": "Rachel", "category": "premade"},
            {"voice_id": "def", "name": "Adam"}
        ]}"#;
        let parsed: VoicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.voices.len(), 2);
        assert_eq!(parsed.voices[0].name, "Rachel");
        assert_eq!(parsed.voices[1].voice_id, "def");
    }
}
