use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioChannel, AudioTrack, SourceRole};
use super::config::CombineMode;

/// Result of a successful snapshot-and-save.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub frames: usize,
    pub duration_secs: f64,
    pub channels: u16,
    pub sample_rate: u32,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Outcome of `snapshot_and_save`.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(RecordingResult),
    /// Nothing was buffered; no file was written.
    Empty,
}

impl SaveOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn saved(&self) -> Option<&RecordingResult> {
        match self {
            Self::Saved(result) => Some(result),
            Self::Empty => None,
        }
    }
}

/// Metadata stored alongside a recording.
///
/// Serializable for the optional JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub combine_mode: CombineMode,
    pub tracks: Vec<AudioTrack>,
}

impl RecordingMetadata {
    pub fn new(
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
        sample_rate: u32,
        combine_mode: CombineMode,
    ) -> Self {
        let (channels, tracks) = match combine_mode {
            CombineMode::Concatenate => (
                4,
                vec![
                    AudioTrack {
                        role: SourceRole::Microphone,
                        channel: AudioChannel::Stereo,
                        first_channel: 0,
                    },
                    AudioTrack {
                        role: SourceRole::SystemLoopback,
                        channel: AudioChannel::Stereo,
                        first_channel: 2,
                    },
                ],
            ),
            CombineMode::Mix => (
                2,
                vec![
                    AudioTrack {
                        role: SourceRole::Microphone,
                        channel: AudioChannel::Stereo,
                        first_channel: 0,
                    },
                    AudioTrack {
                        role: SourceRole::SystemLoopback,
                        channel: AudioChannel::Stereo,
                        first_channel: 0,
                    },
                ],
            ),
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
            sample_rate,
            channels,
            combine_mode,
            tracks,
        }
    }
}
