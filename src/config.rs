//! # Configuration Management
//!
//! Loads the application configuration once at startup from several sources:
//! - Default values (built into the code)
//! - An optional `tts-batch.toml` file (or the path given with `--config`)
//! - Environment variables, usually supplied through a `.env` file
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (`ELEVENLABS_API_KEY`, `TTS_RETRY_COUNT`, ...)
//! 2. Configuration file
//! 3. Default values (defined in the Default impl)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: `Deserialize` turns the merged sources into typed structs
//! - **Builder pattern**: `config::Config::builder()` stacks sources in priority order
//! - **Closures**: `load_with` takes the environment lookup as an `Fn`, so tests
//!   never touch the real process environment
//! - **Result<T, E>**: every step returns a [`ConfigResult`] that `?` propagates
//!
//! The loaded [`AppConfig`] is validated and then handed explicitly to the
//! components that need it.

use serde::{Deserialize, Serialize};  // For reading the merged sources into structs
use std::path::Path;                  // Optional config file location
use std::time::Duration;              // Timeouts and retry delays

use crate::audio::format::OutputFormat;
use crate::error::{ConfigError, ConfigResult};
use crate::synthesis::{RetryPolicy, VoiceSettings};

/// Main application configuration.
///
/// ## Why separate config structs:
/// Service settings and batch settings come from different places (account
/// and voice on one side, files and retries on the other) and are handed to
/// different components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub elevenlabs: ElevenLabsConfig,
    pub batch: BatchConfig,
}

/// Settings for the remote synthesis service.
///
/// ## Voice Tuning:
/// - `stability`, `similarity_boost`, `style`: 0.0 to 1.0
/// - `speed`: speaking rate multiplier (1.0 is normal)
/// - `use_speaker_boost`: enhances similarity to the original speaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    pub api_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,  // Parsed into an OutputFormat by output_format()
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub speed: f32,
    pub use_speaker_boost: bool,
    pub request_timeout_secs: u64,  // Bounds a whole request, body included
}

/// Settings for the batch run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub input_file: String,
    pub output_dir: String,
    pub retry_count: u32,       // Total attempts per line, the first one included
    pub retry_delay_secs: f64,  // f64 so fractional delays like 0.5 work
}

/// Provides default configuration values.
///
/// Credentials have no sensible default, so they start empty and `validate`
/// rejects them until the environment or a file fills them in.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            elevenlabs: ElevenLabsConfig {
                api_url: "https://api.elevenlabs.io/v1".to_string(),
                api_key: String::new(),                         // Must come from the environment
                voice_id: String::new(),
                model_id: "eleven_multilingual_v2".to_string(),
                output_format: "ulaw_8000".to_string(),         // Telephony quality, WAVE framed
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.0,                                     // No style exaggeration
                speed: 1.0,                                     // Normal speaking rate
                use_speaker_boost: true,
                request_timeout_secs: 120,                      // Long lines take a while to stream
            },
            batch: BatchConfig {
                input_file: "input.txt".to_string(),
                output_dir: "output".to_string(),
                retry_count: 3,
                retry_delay_secs: 5.0,
            },
        }
    }
}

/// Environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("ELEVENLABS_API_KEY", "elevenlabs.api_key"),
    ("ELEVENLABS_VOICE_ID", "elevenlabs.voice_id"),
    ("ELEVENLABS_API_URL", "elevenlabs.api_url"),
    ("ELEVENLABS_MODEL_ID", "elevenlabs.model_id"),
    ("ELEVENLABS_OUTPUT_FORMAT", "elevenlabs.output_format"),
    ("ELEVENLABS_STABILITY", "elevenlabs.stability"),
    ("ELEVENLABS_SIMILARITY_BOOST", "elevenlabs.similarity_boost"),
    ("ELEVENLABS_STYLE", "elevenlabs.style"),
    ("ELEVENLABS_SPEED", "elevenlabs.speed"),
    ("TTS_REQUEST_TIMEOUT_SECS", "elevenlabs.request_timeout_secs"),
    ("TTS_INPUT_FILE", "batch.input_file"),
    ("TTS_OUTPUT_DIR", "batch.output_dir"),
    ("TTS_RETRY_COUNT", "batch.retry_count"),
    ("TTS_RETRY_DELAY_SECS", "batch.retry_delay_secs"),
];

const SPEAKER_BOOST_ENV: &str = "ELEVENLABS_USE_SPEAKER_BOOST";

impl AppConfig {
    /// Load configuration from the process environment and an optional file.
    ///
    /// When `file` is `None`, `tts-batch.toml` in the working directory is
    /// used if it exists.
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with(file, |key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve environment variables.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Layer the config file on top (required only when given explicitly)
    /// 3. Apply every variable in `ENV_OVERRIDES` that `lookup` resolves
    /// 4. Apply `ELEVENLABS_USE_SPEAKER_BOOST` through [`parse_flag`]
    ///
    /// ## Rust Concepts:
    /// - **Generic `F: Fn`**: any closure works, e.g. a `HashMap` lookup in tests
    /// - **`?` with `From`**: `config::ConfigError` converts into [`ConfigError::Source`]
    pub fn load_with<F>(file: Option<&Path>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("tts-batch").required(false),
        };

        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file_source);

        for (env_var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(env_var) {
                settings = settings.set_override(*key, value)?;
            }
        }

        if let Some(value) = lookup(SPEAKER_BOOST_ENV) {
            settings = settings.set_override("elevenlabs.use_speaker_boost", parse_flag(&value))?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration can drive a batch run.
    ///
    /// ## What this checks:
    /// - API key and voice id are present
    /// - Output format is one the service accepts
    /// - The service URL is an absolute http(s) URL
    /// - At least one delivery attempt is allowed
    /// - Retry delay and request timeout are usable durations
    ///
    /// A configuration that passes here can be turned into a client and a
    /// retry policy without further failures.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.elevenlabs.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                what: "API key",
                env_var: "ELEVENLABS_API_KEY",
            });
        }

        if self.elevenlabs.voice_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                what: "Voice ID",
                env_var: "ELEVENLABS_VOICE_ID",
            });
        }

        self.output_format()?;

        let url = reqwest::Url::parse(&self.elevenlabs.api_url)
            .map_err(|e| ConfigError::invalid("elevenlabs.api_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "elevenlabs.api_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.batch.retry_count == 0 {
            return Err(ConfigError::invalid("batch.retry_count", "must be at least 1"));
        }

        self.retry_delay()?;

        if self.elevenlabs.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "elevenlabs.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// The validated output format.
    pub fn output_format(&self) -> ConfigResult<OutputFormat> {
        self.elevenlabs
            .output_format
            .parse()
            .map_err(|reason| ConfigError::invalid("elevenlabs.output_format", reason))
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.elevenlabs.stability,
            similarity_boost: self.elevenlabs.similarity_boost,
            style: self.elevenlabs.style,
            use_speaker_boost: self.elevenlabs.use_speaker_boost,
            speed: self.elevenlabs.speed,
        }
    }

    pub fn retry_policy(&self) -> ConfigResult<RetryPolicy> {
        Ok(RetryPolicy::new(self.batch.retry_count, self.retry_delay()?))
    }

    /// The pause between attempts. Negative, non-finite and out-of-range
    /// values are rejected instead of panicking in `Duration`.
    fn retry_delay(&self) -> ConfigResult<Duration> {
        Duration::try_from_secs_f64(self.batch.retry_delay_secs).map_err(|e| {
            ConfigError::invalid(
                "batch.retry_delay_secs",
                format!("must be a non-negative number of seconds ({})", e),
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.elevenlabs.request_timeout_secs)
    }
}

/// Interpret a boolean flag the way the environment file documents it:
/// `true`, `1` and `yes` (any case) are on, everything else is off.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
