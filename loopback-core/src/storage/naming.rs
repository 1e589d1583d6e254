//! Date-based sequential recording file names.
//!
//! `Dated`:   `recording-2024-01-01-1.wav`, `recording-2024-01-01-2.wav`, ...
//! `Compact`: `recording01012401.wav`, `recording01012402.wav`, ...
//!
//! The next number is one past the highest existing number for the same day.
//! Names whose trailing segment is not a plain integer are ignored.

use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDate;

use crate::models::config::FilenameStyle;

pub const RECORDING_EXTENSION: &str = "wav";

/// File name prefix shared by all recordings of `date`.
pub fn recording_prefix(style: FilenameStyle, date: NaiveDate) -> String {
    match style {
        FilenameStyle::Dated => format!("recording-{}-", date.format("%Y-%m-%d")),
        FilenameStyle::Compact => format!("recording{}", date.format("%d%m%y")),
    }
}

/// File name of recording number `sequence` on `date`.
pub fn recording_file_name(style: FilenameStyle, date: NaiveDate, sequence: u32) -> String {
    let prefix = recording_prefix(style, date);
    match style {
        FilenameStyle::Dated => format!("{}{}.{}", prefix, sequence, RECORDING_EXTENSION),
        FilenameStyle::Compact => format!("{}{:02}.{}", prefix, sequence, RECORDING_EXTENSION),
    }
}

/// Sequence number encoded in `file_name`, if it is a recording of `date`.
pub fn parse_sequence(style: FilenameStyle, date: NaiveDate, file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(&recording_prefix(style, date))?;
    let digits = rest.strip_suffix(&format!(".{}", RECORDING_EXTENSION))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next free sequence number for `date` in `directory`.
///
/// A missing directory counts as empty.
pub fn next_sequence(directory: &Path, style: FilenameStyle, date: NaiveDate) -> io::Result<u32> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(e),
    };

    let mut highest = 0u32;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(n) = parse_sequence(style, date, name) {
            highest = highest.max(n);
        }
    }
    Ok(highest.saturating_add(1))
}
