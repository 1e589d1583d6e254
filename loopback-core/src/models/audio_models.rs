use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical role of a capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    Microphone,
    SystemLoopback,
}

impl SourceRole {
    /// Short label used for thread names and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::SystemLoopback => "system-loopback",
        }
    }

    /// The other role of the pair.
    pub fn sibling(&self) -> Self {
        match self {
            Self::Microphone => Self::SystemLoopback,
            Self::SystemLoopback => Self::Microphone,
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Audio channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioChannel {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "LR")]
    Stereo,
}

/// A track in a saved recording and the file channels it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub role: SourceRole,
    pub channel: AudioChannel,
    /// Zero-based index of the first file channel carrying this track.
    pub first_channel: u16,
}

/// A capture-capable input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub id: String,
    pub name: String,
    pub max_input_channels: u16,
    pub is_default: bool,
}

/// A device whose output can be captured as system audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackDeviceInfo {
    pub id: String,
    pub name: String,
    pub host_api: String,
    pub is_default: bool,
}

/// Counters for debugging a listening session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub mic_chunks_captured: u64,
    pub system_chunks_captured: u64,
    pub mic_read_errors: u64,
    pub system_read_errors: u64,
    pub mic_format: String,
    pub system_format: String,
    pub recordings_saved: u64,
    pub bytes_written: u64,
}

impl SessionDiagnostics {
    /// Chunks captured so far for `role`.
    pub fn chunks_captured(&self, role: SourceRole) -> u64 {
        match role {
            SourceRole::Microphone => self.mic_chunks_captured,
            SourceRole::SystemLoopback => self.system_chunks_captured,
        }
    }
}
