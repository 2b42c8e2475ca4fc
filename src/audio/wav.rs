//! # WAVE Container Headers
//!
//! Builds RIFF/WAVE headers for headerless PCM and µ-law payloads so the
//! synthesized audio can be played as a standalone file.
//!
//! ## Layout (little-endian throughout):
//! ```text
//! "RIFF" <overall_size:u32> "WAVE"
//! "fmt " <fmt_size:u32> <tag:u16> <channels:u16> <rate:u32>
//!        <byte_rate:u32> <block_align:u16> <bits:u16> [<cb_size:u16> if µ-law]
//! "data" <data_length:u32>
//! ```
//!
//! PCM headers are 44 bytes. µ-law headers carry the extra `cbSize` field and
//! are 46 bytes.

use byteorder::{LittleEndian, WriteBytesExt};
use thiserror::Error;

use crate::audio::format::{AudioEncoding, AudioFormatDescriptor};

/// Size of a PCM header in bytes.
pub const PCM_HEADER_LEN: usize = 44;
/// Size of a µ-law header in bytes.
pub const MULAW_HEADER_LEN: usize = 46;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("Audio payload of {0} bytes does not fit in a WAVE container")]
    DataTooLarge(usize),
}

/// A computed WAVE header, ready to be prepended to the sample data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader(Vec<u8>);

impl ContainerHeader {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Compute the WAVE header for `data_length` bytes of samples in `format`.
///
/// ## Errors:
/// - **InvalidFormat**: a µ-law descriptor that is not 8 bits per sample
/// - **DataTooLarge**: the RIFF size field would overflow 32 bits
pub fn synthesize_header(
    data_length: usize,
    format: &AudioFormatDescriptor,
) -> Result<ContainerHeader, HeaderError> {
    let (fmt_size, header_len): (u32, usize) = match format.encoding {
        AudioEncoding::Pcm => (16, PCM_HEADER_LEN),
        AudioEncoding::MuLaw => {
            if format.bits_per_sample != 8 {
                return Err(HeaderError::InvalidFormat(format!(
                    "µ-law requires 8 bits per sample, got {}",
                    format.bits_per_sample
                )));
            }
            (18, MULAW_HEADER_LEN)
        }
    };

    let data_size = u32::try_from(data_length).map_err(|_| HeaderError::DataTooLarge(data_length))?;
    // "WAVE" + fmt chunk (id, size, body) + data chunk header + samples
    let overall_size = 4u32
        .checked_add(8 + fmt_size)
        .and_then(|n| n.checked_add(8))
        .and_then(|n| n.checked_add(data_size))
        .ok_or(HeaderError::DataTooLarge(data_length))?;

    let mut header = Vec::with_capacity(header_len);

    // Writes into a Vec<u8> cannot fail
    write_header(&mut header, overall_size, fmt_size, data_size, format)
        .map_err(|e| HeaderError::InvalidFormat(e.to_string()))?;

    Ok(ContainerHeader(header))
}

fn write_header(
    out: &mut Vec<u8>,
    overall_size: u32,
    fmt_size: u32,
    data_size: u32,
    format: &AudioFormatDescriptor,
) -> std::io::Result<()> {
    out.extend_from_slice(b"RIFF");
    out.write_u32::<LittleEndian>(overall_size)?;
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.write_u32::<LittleEndian>(fmt_size)?;
    out.write_u16::<LittleEndian>(format.encoding.format_tag())?;
    out.write_u16::<LittleEndian>(format.channel_count)?;
    out.write_u32::<LittleEndian>(format.sample_rate)?;
    out.write_u32::<LittleEndian>(format.byte_rate())?;
    out.write_u16::<LittleEndian>(format.block_align())?;
    out.write_u16::<LittleEndian>(format.bits_per_sample)?;
    if format.encoding == AudioEncoding::MuLaw {
        out.write_u16::<LittleEndian>(0)?; // cbSize
    }

    out.extend_from_slice(b"data");
    out.write_u32::<LittleEndian>(data_size)?;
    Ok(())
}

/// Prepend the matching header to `data`, producing a playable WAVE file.
pub fn wrap(data: Vec<u8>, format: &AudioFormatDescriptor) -> Result<Vec<u8>, HeaderError> {
    let header = synthesize_header(data.len(), format)?;
    let mut file = Vec::with_capacity(header.len() + data.len());
    file.extend_from_slice(header.as_bytes());
    file.extend_from_slice(&data);
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        LittleEndian::read_u16(&bytes[offset..offset + 2])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        LittleEndian::read_u32(&bytes[offset..offset + 4])
    }

    #[test]
    fn test_header_lengths() {
        let pcm = AudioFormatDescriptor::pcm(22050, 1, 16);
        let ulaw = AudioFormatDescriptor::mulaw(8000, 1);

        for len in [0usize, 1, 7, 4096, 1_000_003] {
            assert_eq!(synthesize_header(len, &pcm).unwrap().len(), PCM_HEADER_LEN);
            assert_eq!(synthesize_header(len, &ulaw).unwrap().len(), MULAW_HEADER_LEN);
        }
    }

    #[test]
    fn test_header_is_deterministic() {
        let format = AudioFormatDescriptor::pcm(44100, 2, 16);
        let a = synthesize_header(12345, &format).unwrap();
        let b = synthesize_header(12345, &format).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overall_size_matches_file_length() {
        let formats = [
            AudioFormatDescriptor::pcm(16000, 1, 16),
            AudioFormatDescriptor::pcm(24000, 2, 16),
            AudioFormatDescriptor::mulaw(8000, 1),
        ];

        for format in formats {
            for len in [0usize, 100, 3333] {
                let file = wrap(vec![0xAB; len], &format).unwrap();
                assert_eq!(u32_at(&file, 4) as usize, file.len() - 8);
            }
        }
    }

    #[test]
    fn test_pcm_header_fields() {
        let format = AudioFormatDescriptor::pcm(16000, 1, 16);
        let header = synthesize_header(0, &format).unwrap();
        let bytes = header.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(bytes, 4), 36);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(bytes, 16), 16);
        assert_eq!(u16_at(bytes, 20), 1); // format tag
        assert_eq!(u16_at(bytes, 22), 1); // channels
        assert_eq!(u32_at(bytes, 24), 16000);
        assert_eq!(u32_at(bytes, 28), 32000); // byte rate
        assert_eq!(u16_at(bytes, 32), 2); // block align
        assert_eq!(u16_at(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(bytes, 40), 0);
    }

    #[test]
    fn test_mulaw_header_fields() {
        let format = AudioFormatDescriptor::mulaw(8000, 1);
        let header = synthesize_header(100, &format).unwrap();
        let bytes = header.as_bytes();

        assert_eq!(u32_at(bytes, 4), 4 + (8 + 18) + (8 + 100));
        assert_eq!(u32_at(bytes, 16), 18);
        assert_eq!(u16_at(bytes, 20), 7);
        assert_eq!(u32_at(bytes, 28), 8000);
        assert_eq!(u16_at(bytes, 32), 1);
        assert_eq!(u16_at(bytes, 34), 8);
        // cbSize immediately follows bits_per_sample
        assert_eq!(&bytes[36..38], &[0, 0]);
        assert_eq!(&bytes[38..42], b"data");
        assert_eq!(u32_at(bytes, 42), 100);
    }

    #[test]
    fn test_mulaw_rejects_wide_samples() {
        let mut format = AudioFormatDescriptor::mulaw(8000, 1);
        format.bits_per_sample = 16;
        assert!(matches!(
            synthesize_header(10, &format),
            Err(HeaderError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_wrap_preserves_payload() {
        let format = AudioFormatDescriptor::mulaw(8000, 1);
        let payload: Vec<u8> = (0..=255).collect();
        let file = wrap(payload.clone(), &format).unwrap();
        assert_eq!(&file[MULAW_HEADER_LEN..], payload.as_slice());
    }
}
