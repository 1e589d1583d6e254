use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::SessionState;

/// Event delegate for recording session notifications.
///
/// Methods may be called from capture threads as well as the caller's thread.
/// Implementations should marshal to their UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Human-readable status after start, stop, save, and error events.
    fn on_status(&self, message: &str);

    /// Called when the session state changes.
    fn on_state_changed(&self, _state: SessionState) {}

    /// Called when a source fails or a save fails.
    fn on_error(&self, _error: &CaptureError) {}

    /// Called after a recording file has been written.
    fn on_recording_saved(&self, _result: &RecordingResult) {}
}
