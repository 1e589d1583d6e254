use crate::models::audio_models::SourceRole;
use crate::models::chunk::{AudioChunk, StreamSpec};
use crate::models::error::CaptureError;

/// An open device stream that yields fixed-size chunks.
///
/// Owned by exactly one capture thread and never moved off it, so it does
/// not need to be `Send`.
pub trait ChunkReader {
    /// Block until the next full chunk is available.
    ///
    /// - `Ok(Some(chunk))`: a chunk of `chunk_size` frames.
    /// - `Ok(None)`: the backend's poll interval elapsed without a full chunk;
    ///   the caller re-checks its stop flag and calls again.
    /// - `Err(CaptureError::TransientRead(_))`: this read failed; keep reading.
    /// - `Err(CaptureError::StreamTerminated(_))`: the stream is gone.
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, CaptureError>;

    /// Human-readable native format, for diagnostics (e.g. "i16 1ch @ 44100 Hz").
    fn describe(&self) -> String;
}

/// Interface for platform-specific capture devices.
///
/// Implemented by:
/// - `CpalMicrophone` (input device)
/// - `CpalLoopback` (system output capture)
pub trait CaptureBackend: Send + Sync + 'static {
    /// Which side of the recording this backend feeds.
    fn role(&self) -> SourceRole;

    /// Open the stream for `device_id` (None = system default).
    ///
    /// Called on the capture thread. Fails with `DeviceUnavailable` when the
    /// device cannot be opened; the session must not start one-sided.
    fn open(&self, device_id: Option<&str>, spec: &StreamSpec) -> Result<Box<dyn ChunkReader>, CaptureError>;
}
