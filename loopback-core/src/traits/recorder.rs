use crate::models::error::CaptureError;
use crate::models::recording_result::SaveOutcome;
use crate::models::state::SessionState;

/// Object-safe recorder interface for UI collaborators.
///
/// Lets a front end hold a `Box<dyn Recorder>` without naming backend types.
pub trait Recorder: Send {
    fn state(&self) -> SessionState;

    /// Idle → listening. Fails without side effects if a device is unavailable.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Listening → idle. Clears buffered history. No-op when idle.
    fn stop(&mut self);

    /// Save the buffered history of both sources as one file.
    fn snapshot_and_save(&mut self) -> Result<SaveOutcome, CaptureError>;

    /// Start when idle, stop when listening. Returns the new state.
    fn toggle(&mut self) -> Result<SessionState, CaptureError> {
        if self.state().is_listening() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.state())
    }
}
