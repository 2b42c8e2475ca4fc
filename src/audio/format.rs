//! # Audio Format Descriptors
//!
//! Describes the encodings the synthesis service can return and maps the
//! service's output-format identities (`pcm_16000`, `ulaw_8000`, ...) onto
//! them.
//!
//! ## Key Types:
//! - **AudioEncoding**: PCM or µ-law, the two headerless encodings we can frame
//! - **AudioFormatDescriptor**: Encoding plus sample rate, channels and bit depth
//! - **OutputFormat**: A validated output-format identity from configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::audio::wav::HeaderError;

/// Headerless sample encodings that can be wrapped in a WAVE container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// Linear PCM, signed little-endian samples
    Pcm,
    /// G.711 µ-law, always 8 bits per sample
    #[serde(rename = "ulaw")]
    MuLaw,
}

impl AudioEncoding {
    /// WAVE `wFormatTag` value for this encoding.
    pub fn format_tag(self) -> u16 {
        match self {
            AudioEncoding::Pcm => 1,
            AudioEncoding::MuLaw => 7,
        }
    }
}

impl FromStr for AudioEncoding {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pcm" => Ok(AudioEncoding::Pcm),
            "ulaw" | "mulaw" | "µ-law" => Ok(AudioEncoding::MuLaw),
            other => Err(HeaderError::InvalidFormat(format!(
                "unsupported encoding '{}', expected 'pcm' or 'ulaw'",
                other
            ))),
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioEncoding::Pcm => write!(f, "pcm"),
            AudioEncoding::MuLaw => write!(f, "ulaw"),
        }
    }
}

/// Format of a raw sample stream.
///
/// ## Invariants:
/// - `sample_rate`, `channel_count` and `bits_per_sample` are positive
/// - µ-law implies `bits_per_sample == 8`
///
/// Use [`AudioFormatDescriptor::pcm`] and [`AudioFormatDescriptor::mulaw`] to
/// build values that hold these invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatDescriptor {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
}

impl AudioFormatDescriptor {
    /// Linear PCM at the given rate, channel count and bit depth.
    pub fn pcm(sample_rate: u32, channel_count: u16, bits_per_sample: u16) -> Self {
        Self {
            encoding: AudioEncoding::Pcm,
            sample_rate,
            channel_count,
            bits_per_sample,
        }
    }

    /// µ-law at the given rate and channel count (8 bits per sample).
    pub fn mulaw(sample_rate: u32, channel_count: u16) -> Self {
        Self {
            encoding: AudioEncoding::MuLaw,
            sample_rate,
            channel_count,
            bits_per_sample: 8,
        }
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channel_count as u32 * self.bits_per_sample as u32 / 8
    }

    /// Bytes per sample frame (all channels).
    pub fn block_align(&self) -> u16 {
        self.channel_count * self.bits_per_sample / 8
    }
}

/// Output formats accepted by the synthesis service.
///
/// ## Container Handling:
/// - `mp3_44100` arrives already framed and is written as-is
/// - `pcm_*` arrives as headerless 16-bit mono PCM at the embedded rate
/// - `ulaw_8000` arrives as headerless 8-bit mono µ-law
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3_44100,
    Pcm16000,
    Pcm22050,
    Pcm24000,
    Pcm44100,
    Ulaw8000,
}

impl OutputFormat {
    /// Every identity the service accepts, in the order they are reported.
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Mp3_44100,
        OutputFormat::Pcm16000,
        OutputFormat::Pcm22050,
        OutputFormat::Pcm24000,
        OutputFormat::Pcm44100,
        OutputFormat::Ulaw8000,
    ];

    /// Identity string sent as the `output_format` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Mp3_44100 => "mp3_44100",
            OutputFormat::Pcm16000 => "pcm_16000",
            OutputFormat::Pcm22050 => "pcm_22050",
            OutputFormat::Pcm24000 => "pcm_24000",
            OutputFormat::Pcm44100 => "pcm_44100",
            OutputFormat::Ulaw8000 => "ulaw_8000",
        }
    }

    /// File extension for outputs in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3_44100 => "mp3",
            _ => "wav",
        }
    }

    /// `Accept` header matching the body the service will stream back.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Mp3_44100 => "audio/mpeg",
            OutputFormat::Ulaw8000 => "audio/basic",
            _ => "audio/pcm",
        }
    }

    /// Sample layout of the headerless payload, or `None` when the service
    /// already returns a complete container.
    pub fn descriptor(self) -> Option<AudioFormatDescriptor> {
        match self {
            OutputFormat::Mp3_44100 => None,
            OutputFormat::Ulaw8000 => Some(AudioFormatDescriptor::mulaw(8000, 1)),
            pcm => {
                // The rate is embedded in the identity: pcm_<rate>
                let rate = pcm
                    .as_str()
                    .rsplit('_')
                    .next()
                    .and_then(|r| r.parse::<u32>().ok())?;
                Some(AudioFormatDescriptor::pcm(rate, 1, 16))
            }
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.as_str()).collect();
                format!(
                    "Invalid output format: {}. Must be one of [{}]",
                    wanted,
                    valid.join(", ")
                )
            })
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
