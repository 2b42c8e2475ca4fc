//! # tts-batch - Main Application Entry Point
//!
//! Converts every non-blank line of a text file into a numbered audio file
//! using a remote text-to-speech service.
//!
//! ## Application Architecture:
//! - **config**: Layered configuration (defaults, TOML file, environment)
//! - **error**: Startup configuration errors
//! - **audio**: Output formats and WAVE container synthesis
//! - **synthesis**: Remote service client and retrying delivery
//! - **output**: Numbering of output files
//! - **batch**: Line-by-line conversion of the input file
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: synthesis requests and retry delays run on a tokio runtime
//! - **Traits**: delivery only knows the `SpeechSynthesizer` trait, so tests
//!   swap the HTTP client for a scripted one
//! - **Result<T, E>**: startup errors bubble up to `main` through `?`
//! - **ExitCode**: per-line failures do not abort the run but still set the
//!   process exit status
//!
//! ## Modes:
//! - Default: batch-convert the input file into the output directory
//! - `--list-voices`: print the voices available to the account and exit

// Module declarations
mod audio;      // Output formats and WAVE headers (audio/ directory)
mod batch;      // Input reading and the line-by-line run (batch.rs)
mod config;     // Configuration management (config.rs)
mod error;      // Configuration error types (error.rs)
mod output;     // Output file numbering (output.rs)
mod synthesis;  // Remote client and retrying delivery (synthesis/ directory)

use anyhow::{Context, Result};     // Startup errors with context
use clap::Parser;                  // Derive-based argument parsing
use std::path::PathBuf;
use std::process::ExitCode;        // 0 when every line was written, 1 otherwise
use tracing::{info, warn};         // Structured logging
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};  // Logging setup

use crate::config::AppConfig;
use crate::output::OutputSequence;
use crate::synthesis::{Delivery, ElevenLabsClient, SpeechSynthesizer, VoiceProfile};

/// Batch text-to-speech converter
#[derive(Parser, Debug)]
#[command(name = "tts-batch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// List the voices available to the configured account and exit
    #[arg(long)]
    list_voices: bool,

    /// Text file with one utterance per line (default: input.txt)
    #[arg(short, long)]
    input: Option<String>,

    /// Directory that receives the numbered audio files (default: output)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Configuration file (default: tts-batch.toml, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads `.env`** and sets up logging
/// 2. **Builds the configuration** from defaults, file, environment and CLI
/// 3. **Creates the synthesis client** from the validated settings
/// 4. **Lists voices** and exits, when asked to
/// 5. **Converts every line** of the input file and reports the outcome
///
/// ## Key Rust Concepts:
/// - `#[tokio::main(flavor = "current_thread")]`: one thread is enough, since
///   lines are converted one at a time
/// - `Result<ExitCode>`: configuration errors end the run early through `?`,
///   while failed lines only change the exit status
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let dotenv_path = load_environment_variables();
    init_tracing()?;
    match dotenv_path {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => warn!("No .env file found, using the process environment"),
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.batch.input_file = input;
    }
    if let Some(output_dir) = cli.output_dir {
        config.batch.output_dir = output_dir;
    }
    config.validate()?;

    let output_format = config.output_format()?;
    let client = ElevenLabsClient::new(
        &config.elevenlabs.api_url,
        &config.elevenlabs.api_key,
        config.request_timeout(),
    )
    .context("Failed to create synthesis client")?;

    if cli.list_voices {
        return list_voices(&client).await;
    }

    info!(
        "Starting tts-batch v{} ({}, voice {})",
        env!("CARGO_PKG_VERSION"),
        output_format,
        config.elevenlabs.voice_id
    );

    let mut sequence = OutputSequence::scan(&config.batch.output_dir, output_format.extension())?;
    let lines = batch::read_lines(&config.batch.input_file)?;

    let profile = VoiceProfile {
        voice_id: config.elevenlabs.voice_id.clone(),
        model_id: config.elevenlabs.model_id.clone(),
        output_format,
        settings: config.voice_settings(),
    };
    let delivery = Delivery::new(client, profile, config.retry_policy()?);

    let report = batch::run(&lines, &mut sequence, &delivery).await;
    report.log_summary();

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print `Name: ..., Voice ID: ...` for every available voice.
async fn list_voices(client: &impl SpeechSynthesizer) -> Result<ExitCode> {
    let voices = client.list_voices().await.context("Failed to list voices")?;
    for voice in voices {
        println!("Name: {}, Voice ID: {}", voice.name, voice.voice_id);
    }
    Ok(ExitCode::SUCCESS)
}

/// Load a `.env` file, preferring the one next to the executable over the
/// one in the working directory. Returns the file that was loaded.
fn load_environment_variables() -> Option<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
        .filter(|path| path.exists());

    if let Some(path) = beside_exe {
        if dotenv::from_path(&path).is_ok() {
            return Some(path);
        }
    }

    dotenv::dotenv().ok()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls verbosity; without it only this crate's info-level
/// events are shown.
///
/// ## Rust Concepts:
/// - **Layers**: the registry combines a filter layer with a formatting layer
/// - **unwrap_or_else**: falls back to the default filter when `RUST_LOG` is
///   unset or malformed
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tts_batch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    Ok(())
}
