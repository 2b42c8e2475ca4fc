//! # Audio Container Module
//!
//! Describes the audio formats the synthesis service returns and wraps
//! headerless sample streams in a RIFF/WAVE container.
//!
//! ## Key Components:
//! - **Format**: Output-format identities, encodings and sample layouts
//! - **WAV**: Byte-exact header synthesis for PCM and µ-law payloads

pub mod format;   // Output formats and sample layout descriptors
pub mod wav;      // WAVE header synthesis
