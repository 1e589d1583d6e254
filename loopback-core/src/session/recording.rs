use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::audio_models::{SessionDiagnostics, SourceRole};
use crate::models::chunk::StreamSpec;
use crate::models::config::{RecorderConfiguration, SnapshotPolicy};
use crate::models::error::CaptureError;
use crate::models::recording_result::SaveOutcome;
use crate::models::state::SessionState;
use crate::processing::combiner::{CombineOutcome, Combiner};
use crate::processing::normalizer::StreamFormatNormalizer;
use crate::processing::ring_buffer::SharedRingBuffer;
use crate::session::capture_source::{CaptureSource, ChunkBuffer, StopSignal, TerminationHook};
use crate::storage::recording_writer::RecordingWriter;
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::completion_cue::CompletionCue;
use crate::traits::recorder::Recorder;
use crate::traits::session_delegate::SessionDelegate;

/// Delegate shared with the capture threads' termination hooks.
type DelegateSlot = Arc<RwLock<Option<Arc<dyn SessionDelegate>>>>;

/// Retrospective recorder for one microphone and one loopback source.
///
/// Generic over the two backends via the `CaptureBackend` trait. Each source
/// fills its own ring buffer on its own thread; a save copies both buffers,
/// normalizes, combines, and writes without pausing capture:
/// ```text
/// [Mic Backend] → [Mic RingBuffer] ──┐
///                                    ├→ [Normalizer] → [Combiner] → [RecordingWriter]
/// [Sys Backend] → [Sys RingBuffer] ──┘
/// ```
pub struct RecordingSession<M: CaptureBackend, S: CaptureBackend> {
    config: RecorderConfiguration,
    state: SessionState,
    mic: CaptureSource<M>,
    system: CaptureSource<S>,
    mic_buffer: ChunkBuffer,
    system_buffer: ChunkBuffer,
    normalizer: StreamFormatNormalizer,
    combiner: Combiner,
    writer: RecordingWriter,
    recordings_saved: u64,
    bytes_written: u64,
    delegate: DelegateSlot,
    cue: Option<Arc<dyn CompletionCue>>,
}

impl<M: CaptureBackend, S: CaptureBackend> RecordingSession<M, S> {
    pub fn new(mic: M, system: S, config: RecorderConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        if mic.role() != SourceRole::Microphone || system.role() != SourceRole::SystemLoopback {
            return Err(CaptureError::ConfigurationFailed(format!(
                "backends in the wrong slots: got {} and {}",
                mic.role(),
                system.role()
            )));
        }

        let capacity = config.buffer_capacity();
        let spec = StreamSpec {
            sample_rate: config.sample_rate,
            chunk_size: config.chunk_size,
        };
        let mic_buffer = SharedRingBuffer::new(capacity);
        let system_buffer = SharedRingBuffer::new(capacity);

        log::debug!(
            "session configured: {}s retention, {} chunks of {} frames per source",
            config.retention_seconds,
            capacity,
            config.chunk_size
        );

        Ok(Self {
            mic: CaptureSource::new(mic, config.mic_device_id.clone(), spec, mic_buffer.clone()),
            system: CaptureSource::new(system, config.system_device_id.clone(), spec, system_buffer.clone()),
            mic_buffer,
            system_buffer,
            normalizer: StreamFormatNormalizer::new(config.sample_rate),
            combiner: Combiner::new(config.combine_mode),
            writer: RecordingWriter::new(config.filename_style, config.combine_mode, config.write_metadata),
            recordings_saved: 0,
            bytes_written: 0,
            delegate: Arc::new(RwLock::new(None)),
            cue: None,
            state: SessionState::Idle,
            config,
        })
    }

    /// Takes effect immediately, including for streams already running.
    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        *self.delegate.write() = Some(delegate);
    }

    pub fn set_completion_cue(&mut self, cue: Arc<dyn CompletionCue>) {
        self.cue = Some(cue);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        let mic = self.mic.counters();
        let system = self.system.counters();
        SessionDiagnostics {
            mic_chunks_captured: mic.chunks(),
            system_chunks_captured: system.chunks(),
            mic_read_errors: mic.read_errors(),
            system_read_errors: system.read_errors(),
            mic_format: self.mic.format().to_string(),
            system_format: self.system.format().to_string(),
            recordings_saved: self.recordings_saved,
            bytes_written: self.bytes_written,
        }
    }

    /// Whether both capture loops are currently running.
    pub fn is_capturing(&self) -> bool {
        self.mic.state().is_running() && self.system.state().is_running()
    }

    /// Seconds of audio currently buffered for `role`.
    pub fn buffered_seconds(&self, role: SourceRole) -> f64 {
        let buffer = match role {
            SourceRole::Microphone => &self.mic_buffer,
            SourceRole::SystemLoopback => &self.system_buffer,
        };
        buffer.snapshot().items.iter().map(|c| c.duration_secs()).sum()
    }

    /// Start both sources. Transitions: idle → listening.
    ///
    /// If either device fails to open, both are stopped, the session stays
    /// idle, and the error is returned.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.is_listening() {
            return Err(CaptureError::AlreadyListening);
        }

        self.install_termination_hooks();

        if let Err(e) = self.mic.start() {
            return Err(self.abort_start(e));
        }
        if let Err(e) = self.system.start() {
            return Err(self.abort_start(e));
        }
        // The mic may have terminated before the system side was running to be stopped.
        if !self.mic.state().is_running() || !self.system.state().is_running() {
            return Err(self.abort_start(CaptureError::StreamTerminated(
                "a stream closed while listening was starting".into(),
            )));
        }

        self.set_state(SessionState::Listening);
        self.status("Listening started.");
        Ok(())
    }

    /// Stop both sources and clear buffered history. Transitions: listening → idle.
    ///
    /// No-op when already idle.
    pub fn stop(&mut self) {
        if self.state.is_idle() {
            return;
        }
        self.mic.stop();
        self.system.stop();
        self.mic_buffer.clear();
        self.system_buffer.clear();

        self.set_state(SessionState::Idle);
        self.status("Listening stopped. Buffers cleared.");
    }

    /// Save the buffered history of both sources as one file.
    ///
    /// Capture keeps running; buffers are only locked long enough to copy
    /// their chunk pointers.
    pub fn snapshot_and_save(&mut self) -> Result<SaveOutcome, CaptureError> {
        if !self.state.is_listening() {
            self.status("Not listening. Start listening before saving.");
            return Err(CaptureError::NotListening);
        }

        let mic_snapshot = self.mic_buffer.snapshot();
        let system_snapshot = self.system_buffer.snapshot();

        if mic_snapshot.is_empty() && system_snapshot.is_empty() {
            self.status("Buffers are empty. Nothing to save.");
            return Ok(SaveOutcome::Empty);
        }

        let mic = self.normalizer.normalize(&mic_snapshot.items, SourceRole::Microphone);
        let system = self.normalizer.normalize(&system_snapshot.items, SourceRole::SystemLoopback);
        log::debug!(
            "snapshot: {} mic chunks ({} frames), {} system chunks ({} frames)",
            mic_snapshot.len(),
            mic.frames(),
            system_snapshot.len(),
            system.frames()
        );

        let waveform = match self.combiner.combine(&mic, &system) {
            CombineOutcome::Waveform(waveform) => waveform,
            CombineOutcome::Empty => {
                let missing = if mic.is_empty() { SourceRole::Microphone } else { SourceRole::SystemLoopback };
                self.status(&format!("No {} audio buffered yet. Nothing to save.", missing));
                return Ok(SaveOutcome::Empty);
            }
        };

        let result = match self.writer.write(&waveform, &self.config.output_directory) {
            Ok(result) => result,
            Err(e) => {
                log::error!("failed to save recording: {}", e);
                if let Some(delegate) = self.delegate() {
                    delegate.on_error(&e);
                }
                self.status(&format!("Failed to save recording: {}", e));
                return Err(e);
            }
        };

        self.recordings_saved += 1;
        self.bytes_written += waveform.samples.len() as u64 * 2;

        if let Some(delegate) = self.delegate() {
            delegate.on_recording_saved(&result);
        }
        self.status(&format!("Recording saved as {}", result.file_path.display()));

        if self.config.snapshot_policy == SnapshotPolicy::Clear {
            self.mic_buffer.discard_through(mic_snapshot.end);
            self.system_buffer.discard_through(system_snapshot.end);
            self.status("Buffers cleared for the next recording.");
        }

        if let Some(ref cue) = self.cue {
            cue.play();
        }

        Ok(SaveOutcome::Saved(result))
    }

    // --- Internal helpers ---

    fn delegate(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.delegate.read().clone()
    }

    fn set_state(&mut self, new_state: SessionState) {
        self.state = new_state;
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(new_state);
        }
    }

    fn status(&self, message: &str) {
        log::info!("{}", message);
        if let Some(delegate) = self.delegate() {
            delegate.on_status(message);
        }
    }

    /// Undo a partial start and report why.
    fn abort_start(&mut self, error: CaptureError) -> CaptureError {
        self.mic.stop();
        self.system.stop();
        self.mic_buffer.clear();
        self.system_buffer.clear();

        if let Some(delegate) = self.delegate() {
            delegate.on_error(&error);
        }
        self.status(&format!("Could not start listening: {}", error));
        error
    }

    /// When one stream dies, stop its sibling so the session never keeps
    /// recording one side alone, and tell the delegate.
    fn install_termination_hooks(&mut self) {
        let mic_hook = termination_hook(self.system.stop_signal(), Arc::clone(&self.delegate));
        let system_hook = termination_hook(self.mic.stop_signal(), Arc::clone(&self.delegate));
        self.mic.set_termination_hook(mic_hook);
        self.system.set_termination_hook(system_hook);
    }
}

fn termination_hook(sibling: StopSignal, delegate: DelegateSlot) -> TerminationHook {
    Arc::new(move |role: SourceRole, error: &CaptureError| {
        sibling.request_stop();
        log::warn!("{} stream lost; stopping {} capture", role, role.sibling());
        let delegate = delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_error(error);
            delegate.on_status(&format!(
                "{} capture stopped ({}). {} capture stopped too; buffered audio can still be saved.",
                role,
                error,
                role.sibling()
            ));
        }
    })
}

impl<M: CaptureBackend, S: CaptureBackend> Recorder for RecordingSession<M, S> {
    fn state(&self) -> SessionState {
        self.state
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        RecordingSession::start(self)
    }

    fn stop(&mut self) {
        RecordingSession::stop(self)
    }

    fn snapshot_and_save(&mut self) -> Result<SaveOutcome, CaptureError> {
        RecordingSession::snapshot_and_save(self)
    }
}

impl<M: CaptureBackend, S: CaptureBackend> Drop for RecordingSession<M, S> {
    fn drop(&mut self) {
        self.stop();
    }
}
