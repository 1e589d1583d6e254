use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::models::config::{CombineMode, FilenameStyle};
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::combiner::CombinedWaveform;
use crate::processing::wav_format::{self, PcmFormat};
use crate::storage::metadata;
use crate::storage::naming;

/// Attempts at claiming a file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Writes combined waveforms to uniquely named WAV files.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [raw 16-bit little-endian PCM, interleaved]
/// ```
#[derive(Debug, Clone)]
pub struct RecordingWriter {
    filename_style: FilenameStyle,
    combine_mode: CombineMode,
    write_metadata: bool,
}

impl RecordingWriter {
    pub fn new(filename_style: FilenameStyle, combine_mode: CombineMode, write_metadata: bool) -> Self {
        Self {
            filename_style,
            combine_mode,
            write_metadata,
        }
    }

    /// Write `waveform` under `directory`, named for today's local date.
    pub fn write(&self, waveform: &CombinedWaveform, directory: &Path) -> Result<RecordingResult, CaptureError> {
        self.write_for_date(waveform, directory, chrono::Local::now().date_naive())
    }

    /// Write `waveform` under `directory`, named for `date`.
    pub fn write_for_date(
        &self,
        waveform: &CombinedWaveform,
        directory: &Path,
        date: NaiveDate,
    ) -> Result<RecordingResult, CaptureError> {
        fs::create_dir_all(directory).map_err(|e| {
            CaptureError::WriteError(format!("failed to create directory {}: {}", directory.display(), e))
        })?;

        let data = waveform.pcm_bytes();
        if data.len() as u64 > wav_format::MAX_DATA_SIZE {
            return Err(CaptureError::WriteError(format!(
                "recording too large for WAV: {} bytes",
                data.len()
            )));
        }
        let header = wav_format::generate_wav_header(
            PcmFormat::pcm16(waveform.sample_rate, waveform.channels),
            data.len() as u32,
        );

        let (file_path, file) = self.create_unique(directory, date)?;
        if let Err(e) = write_all(file, &header, &data) {
            // Leave no truncated file behind for the retry to number around.
            fs::remove_file(&file_path).ok();
            return Err(CaptureError::WriteError(format!(
                "failed to write {}: {}",
                file_path.display(),
                e
            )));
        }

        let checksum = sha256_hex(&[&header[..], &data[..]]);
        let duration = waveform.duration_secs();
        let metadata = RecordingMetadata::new(
            duration,
            &file_path.to_string_lossy(),
            &checksum,
            waveform.sample_rate,
            self.combine_mode,
        );
        if self.write_metadata {
            if let Err(e) = metadata::write_metadata(&metadata, &file_path) {
                // The caller keeps its history and retries, so report no file.
                fs::remove_file(&file_path).ok();
                return Err(e);
            }
        }

        log::info!(
            "wrote {} ({} frames, {:.2}s, {} channels)",
            file_path.display(),
            waveform.frames(),
            duration,
            waveform.channels
        );

        Ok(RecordingResult {
            file_path,
            frames: waveform.frames(),
            duration_secs: duration,
            channels: waveform.channels,
            sample_rate: waveform.sample_rate,
            checksum,
            metadata,
        })
    }

    /// Claim the next free name with `create_new`, stepping past names taken
    /// between the directory scan and the create.
    fn create_unique(&self, directory: &Path, date: NaiveDate) -> Result<(PathBuf, File), CaptureError> {
        let mut sequence = naming::next_sequence(directory, self.filename_style, date)
            .map_err(|e| CaptureError::WriteError(format!("failed to scan {}: {}", directory.display(), e)))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = directory.join(naming::recording_file_name(self.filename_style, date, sequence));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => sequence = sequence.saturating_add(1),
                Err(e) => {
                    return Err(CaptureError::WriteError(format!(
                        "failed to create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Err(CaptureError::WriteError(format!(
            "no free recording name in {}",
            directory.display()
        )))
    }
}

fn write_all(file: File, header: &[u8], data: &[u8]) -> io::Result<()> {
    let mut out = BufWriter::new(file);
    out.write_all(header)?;
    out.write_all(data)?;
    out.flush()?;
    out.get_ref().sync_all()
}

/// SHA-256 hex digest of the concatenated parts.
fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
