//! # loopback-core
//!
//! Platform-agnostic core of a retrospective ("save the last N seconds")
//! recorder for one microphone and one system-audio loopback source.
//!
//! Provides bounded history buffering, format normalization, stream
//! combining, WAV output, and session orchestration. Platform backends
//! implement the `CaptureBackend` trait and plug into the generic
//! `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! loopback-core (this crate)
//! ├── traits/       ← CaptureBackend, ChunkReader, Recorder, SessionDelegate, CompletionCue
//! ├── models/       ← CaptureError, SessionState, RecorderConfiguration, AudioChunk, etc.
//! ├── processing/   ← RingBuffer, StreamFormatNormalizer, Combiner, WAV header generation
//! ├── session/      ← CaptureSource (per-device thread), RecordingSession (orchestrator)
//! └── storage/      ← RecordingWriter, file naming, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioChannel, AudioTrack, InputDeviceInfo, LoopbackDeviceInfo, SessionDiagnostics, SourceRole,
};
pub use models::chunk::{AudioChunk, SampleData, SampleFormat, StreamSpec};
pub use models::config::{CombineMode, FilenameStyle, RecorderConfiguration, SnapshotPolicy};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult, SaveOutcome};
pub use models::state::{SessionState, SourceState};
pub use processing::combiner::{CombineOutcome, CombinedWaveform, Combiner};
pub use processing::normalizer::{NormalizedStream, StreamFormatNormalizer};
pub use processing::ring_buffer::{BufferSnapshot, RingBuffer, SharedRingBuffer};
pub use session::capture_source::CaptureSource;
pub use session::recording::RecordingSession;
pub use storage::recording_writer::RecordingWriter;
pub use traits::capture_backend::{CaptureBackend, ChunkReader};
pub use traits::completion_cue::CompletionCue;
pub use traits::recorder::Recorder;
pub use traits::session_delegate::SessionDelegate;
