//! # Output File Sequence
//!
//! Output files are named `output_NNNN.<ext>` with an index zero-padded to
//! at least four digits (`output_10000.wav` follows `output_9999.wav`). A run
//! continues numbering after the highest index already present in the output
//! directory. The directory is scanned once at startup, so only one
//! writer should use it at a time.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const OUTPUT_NAME_PATTERN: &str = r"^output_(\d{4,})\.(mp3|wav)";

/// Hands out destination paths in strictly increasing order.
#[derive(Debug, Clone)]
pub struct OutputSequence {
    dir: PathBuf,
    extension: &'static str,
    next: u32,
}

impl OutputSequence {
    /// Create `dir` if needed and continue numbering after its highest
    /// existing output file.
    pub fn scan(dir: impl AsRef<Path>, extension: &'static str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let next = next_output_number(&dir)?;
        debug!(dir = %dir.display(), next, "Scanned output directory");

        Ok(Self {
            dir,
            extension,
            next,
        })
    }

    /// Index the next successful write will use.
    pub fn next_index(&self) -> u32 {
        self.next
    }

    /// Destination for the next file, without claiming it.
    pub fn peek_path(&self) -> PathBuf {
        self.dir.join(output_file_name(self.next, self.extension))
    }

    /// Claim the current index after its file has been written.
    pub fn advance(&mut self) {
        self.next += 1;
    }
}

/// `output_0042.wav` style file name.
pub fn output_file_name(index: u32, extension: &str) -> String {
    format!("output_{:04}.{}", index, extension)
}

/// One more than the highest `output_NNNN.(mp3|wav)` index in `dir`, or 1
/// when there is none. Names that do not match, or whose index has no
/// successor in a `u32`, are ignored.
pub fn next_output_number(dir: &Path) -> Result<u32> {
    let pattern = Regex::new(OUTPUT_NAME_PATTERN)?;
    let mut max_number = 0;

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        if let Some(number) = pattern
            .captures(name)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|number| *number < u32::MAX)
        {
            max_number = max_number.max(number);
        }
    }

    Ok(max_number + 1)
}
