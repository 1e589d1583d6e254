/// Fire-and-forget notification played after a recording is saved.
///
/// Must return promptly; it is not part of the data path and its failures
/// are the implementation's to log.
pub trait CompletionCue: Send + Sync {
    fn play(&self);
}
