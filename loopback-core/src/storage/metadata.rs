//! Optional JSON sidecar stored beside each recording.
//!
//! `recording-2024-01-01-3.wav` gets `recording-2024-01-01-3.metadata.json`,
//! which the naming scan never mistakes for a recording.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write the sidecar for `recording_path` and return its path.
///
/// A partially written sidecar is removed before the error is returned.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let sidecar = metadata_path(recording_path);
    let json = serde_json::to_vec_pretty(metadata).map_err(|e| {
        CaptureError::WriteError(format!("failed to encode sidecar for {}: {}", recording_path.display(), e))
    })?;

    if let Err(e) = fs::write(&sidecar, json) {
        if sidecar.is_file() {
            fs::remove_file(&sidecar).ok();
        }
        return Err(CaptureError::WriteError(format!(
            "failed to write sidecar {}: {}",
            sidecar.display(),
            e
        )));
    }
    Ok(sidecar)
}

/// Load the sidecar of an existing recording. Failures map to `Unknown`.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let sidecar = metadata_path(recording_path);
    let file = File::open(&sidecar)
        .map_err(|e| CaptureError::Unknown(format!("cannot open sidecar {}: {}", sidecar.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| CaptureError::Unknown(format!("malformed sidecar {}: {}", sidecar.display(), e)))
}
