//! # Batch Conversion
//!
//! Reads the input file and delivers each non-blank line, in file order, to
//! the next output file.
//!
//! ## Failure Handling:
//! A line that cannot be delivered is logged and recorded in the
//! [`BatchReport`], and processing moves on to the next line. Output indices
//! are only claimed by successful writes, so a run produces a gap-free
//! sequence of files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::output::OutputSequence;
use crate::synthesis::{Delivery, DeliveryError, SpeechSynthesizer};

/// Longest excerpt of a failed line kept in the report.
const EXCERPT_CHARS: usize = 60;

/// A line that could not be converted.
#[derive(Debug)]
pub struct LineFailure {
    /// 1-based position among the non-blank input lines
    pub line: usize,
    pub excerpt: String,
    pub error: DeliveryError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<LineFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log a one-line summary plus one line per failure.
    pub fn log_summary(&self) {
        if self.all_succeeded() {
            info!(
                written = self.written.len(),
                "Batch complete: {} of {} lines converted",
                self.written.len(),
                self.total()
            );
            return;
        }

        warn!(
            written = self.written.len(),
            failed = self.failures.len(),
            "Batch complete: {} of {} lines converted",
            self.written.len(),
            self.total()
        );
        for failure in &self.failures {
            warn!(line = failure.line, "Skipped \"{}\": {}", failure.excerpt, failure.error);
        }
    }
}

/// Read `path` as UTF-8 and return its trimmed, non-blank lines in order.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;

    Ok(parse_lines(&contents))
}

pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deliver every line sequentially, continuing past failures.
pub async fn run<S: SpeechSynthesizer>(
    lines: &[String],
    sequence: &mut OutputSequence,
    delivery: &Delivery<S>,
) -> BatchReport {
    let mut report = BatchReport::default();
    info!(lines = lines.len(), first_index = sequence.next_index(), "Starting batch conversion");

    for (i, text) in lines.iter().enumerate() {
        let destination = sequence.peek_path();
        info!(line = i + 1, path = %destination.display(), "Converting line");

        match delivery.deliver(text, &destination).await {
            Ok(receipt) => {
                sequence.advance();
                report.written.push(receipt.path);
            }
            Err(err) => {
                error!(line = i + 1, error = %err, "Failed to convert line");
                report.failures.push(LineFailure {
                    line: i + 1,
                    excerpt: excerpt(text),
                    error: err,
                });
            }
        }
    }

    report
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
