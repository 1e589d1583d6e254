use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::processing::ring_buffer::RingBuffer;

/// How the two normalized streams are merged into one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// Four channels: microphone L/R followed by system L/R.
    #[default]
    Concatenate,
    /// Two channels: microphone and system summed with int16 saturation.
    Mix,
}

/// What happens to buffered history after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Discard the saved chunks; chunks captured during the save are kept.
    #[default]
    Clear,
    /// Leave buffers intact so later saves may overlap.
    Retain,
}

/// Recording file naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameStyle {
    /// `recording-YYYY-MM-DD-<n>.wav`
    #[default]
    Dated,
    /// `recordingDDMMYY<nn>.wav`
    Compact,
}

/// Recorder configuration, read once when a session is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfiguration {
    /// Key combination that triggers a save. Opaque to the core; kept here so
    /// the whole configuration round-trips through one file.
    pub record_binding: String,

    /// Seconds of history kept per source (default: 60).
    pub retention_seconds: f64,

    /// Target sample rate in Hz for capture and output (default: 44100).
    pub sample_rate: u32,

    /// Frames per captured chunk (default: 512).
    pub chunk_size: usize,

    /// Directory recordings are written to. Created if absent.
    pub output_directory: PathBuf,

    /// Microphone device id, or None for the system default.
    pub mic_device_id: Option<String>,

    /// Loopback device id, or None for the default output device.
    pub system_device_id: Option<String>,

    pub combine_mode: CombineMode,
    pub snapshot_policy: SnapshotPolicy,
    pub filename_style: FilenameStyle,

    /// Write a `.metadata.json` sidecar next to each recording.
    pub write_metadata: bool,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !self.retention_seconds.is_finite() || self.retention_seconds <= 0.0 {
            return Err(format!("retention must be positive: {}", self.retention_seconds));
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.chunk_size == 0 {
            return Err("chunk size must be positive".into());
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err("output directory must not be empty".into());
        }
        Ok(())
    }

    /// Ring buffer capacity in chunks for the configured retention.
    pub fn buffer_capacity(&self) -> usize {
        RingBuffer::<()>::capacity_for(self.retention_seconds, self.sample_rate, self.chunk_size)
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            record_binding: String::new(),
            retention_seconds: 60.0,
            sample_rate: 44100,
            chunk_size: 512,
            output_directory: PathBuf::from("recordings"),
            mic_device_id: None,
            system_device_id: None,
            combine_mode: CombineMode::default(),
            snapshot_policy: SnapshotPolicy::default(),
            filename_style: FilenameStyle::default(),
            write_metadata: false,
        }
    }
}
