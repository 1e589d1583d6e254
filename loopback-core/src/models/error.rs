use thiserror::Error;

/// Errors surfaced by capture sources, sessions, and the recording writer.
///
/// An empty snapshot is not an error; see `SaveOutcome::Empty`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened (in use, removed, invalid id).
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single chunk read failed; the capture loop keeps going.
    #[error("transient read error: {0}")]
    TransientRead(String),

    /// The stream closed or the device disconnected; the source stops.
    #[error("stream terminated: {0}")]
    StreamTerminated(String),

    #[error("session is not listening")]
    NotListening,

    #[error("session is already listening")]
    AlreadyListening,

    /// Writing the recording failed; buffered history is kept for a retry.
    #[error("write error: {0}")]
    WriteError(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Whether a capture loop may continue after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientRead(_))
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        Self::WriteError(e.to_string())
    }
}
