use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::SourceRole;
use crate::models::chunk::{AudioChunk, StreamSpec};
use crate::models::error::CaptureError;
use crate::models::state::SourceState;
use crate::processing::ring_buffer::SharedRingBuffer;
use crate::traits::capture_backend::{CaptureBackend, ChunkReader};

/// Called on the capture thread after a stream terminates.
pub type TerminationHook = Arc<dyn Fn(SourceRole, &CaptureError) + Send + Sync + 'static>;

/// Shared buffer type each source writes into.
pub type ChunkBuffer = SharedRingBuffer<Arc<AudioChunk>>;

/// Requests a capture loop to stop without waiting for it.
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request_stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Per-source capture counters, bumped by the capture thread without locking.
#[derive(Debug, Default)]
pub struct SourceCounters {
    chunks: AtomicU64,
    read_errors: AtomicU64,
}

impl SourceCounters {
    pub fn chunks(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }

    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }
}

/// One capture unit: a backend, a device, a target ring buffer, and the
/// dedicated thread that moves chunks from the former to the latter.
pub struct CaptureSource<B: CaptureBackend> {
    backend: Arc<B>,
    device_id: Option<String>,
    spec: StreamSpec,
    buffer: ChunkBuffer,
    counters: Arc<SourceCounters>,
    format: String,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<SourceState>>,
    on_terminated: Option<TerminationHook>,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl<B: CaptureBackend> CaptureSource<B> {
    pub fn new(backend: B, device_id: Option<String>, spec: StreamSpec, buffer: ChunkBuffer) -> Self {
        Self {
            backend: Arc::new(backend),
            device_id,
            spec,
            buffer,
            counters: Arc::new(SourceCounters::default()),
            format: String::new(),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(SourceState::Stopped)),
            on_terminated: None,
            capture_handle: None,
        }
    }

    pub fn role(&self) -> SourceRole {
        self.backend.role()
    }

    pub fn state(&self) -> SourceState {
        *self.state.lock()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn counters(&self) -> &SourceCounters {
        &self.counters
    }

    /// Native format of the last opened stream, empty before the first open.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(Arc::clone(&self.running))
    }

    /// Hook fired on the capture thread when the stream terminates.
    pub fn set_termination_hook(&mut self, hook: TerminationHook) {
        self.on_terminated = Some(hook);
    }

    /// Open the device and start the capture thread.
    ///
    /// Blocks until the thread reports whether the device opened. On failure
    /// the thread has already exited and `DeviceUnavailable` is returned.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let role = self.role();
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(format!("{} capture already running", role)));
        }
        // A previous loop may have ended on its own after a stream error.
        self.join_capture_thread();

        self.running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<String, CaptureError>>(1);
        let worker = CaptureWorker {
            role,
            buffer: self.buffer.clone(),
            counters: Arc::clone(&self.counters),
            running: Arc::clone(&self.running),
            state: Arc::clone(&self.state),
            on_terminated: self.on_terminated.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let device_id = self.device_id.clone();
        let spec = self.spec;

        let handle = thread::Builder::new()
            .name(format!("capture-{}", role.label()))
            .spawn(move || {
                let reader = match backend.open(device_id.as_deref(), &spec) {
                    Ok(reader) => reader,
                    Err(e) => {
                        worker.running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                *worker.state.lock() = SourceState::Running;
                let _ = ready_tx.send(Ok(reader.describe()));
                worker.run(reader);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::Unknown(format!("failed to spawn {} capture thread: {}", role, e))
            })?;
        self.capture_handle = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(format)) => {
                log::info!(
                    "{} capture started on {} ({})",
                    role,
                    self.device_id.as_deref().unwrap_or("default device"),
                    format
                );
                self.format = format;
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_capture_thread();
                log::error!("{} device failed to open: {}", role, e);
                Err(as_device_unavailable(e))
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                self.join_capture_thread();
                Err(CaptureError::DeviceUnavailable(format!(
                    "{} capture thread exited before the device opened",
                    role
                )))
            }
        }
    }

    /// Stop the capture loop and wait for the native stream to be released.
    ///
    /// Safe to call repeatedly and from any thread that owns the source.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.join_capture_thread() {
            log::info!("{} capture stopped", self.role());
        }
        *self.state.lock() = SourceState::Stopped;
    }

    fn join_capture_thread(&mut self) -> bool {
        let Some(handle) = self.capture_handle.take() else {
            return false;
        };
        if handle.join().is_err() {
            log::error!("{} capture thread panicked", self.role());
        }
        true
    }
}

impl<B: CaptureBackend> Drop for CaptureSource<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn as_device_unavailable(error: CaptureError) -> CaptureError {
    match error {
        CaptureError::DeviceUnavailable(_) => error,
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

/// State moved onto the capture thread.
struct CaptureWorker {
    role: SourceRole,
    buffer: ChunkBuffer,
    counters: Arc<SourceCounters>,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<SourceState>>,
    on_terminated: Option<TerminationHook>,
}

impl CaptureWorker {
    /// Read chunks until stopped or the stream terminates.
    fn run(self, mut reader: Box<dyn ChunkReader>) {
        let mut terminated = None;

        while self.running.load(Ordering::SeqCst) {
            match reader.read_chunk() {
                Ok(Some(chunk)) => {
                    self.buffer.push(Arc::new(chunk));
                    self.counters.chunks.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    log::warn!("{} read failed, continuing: {}", self.role, e);
                    self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    log::error!("{} stream terminated: {}", self.role, e);
                    terminated = Some(e);
                    break;
                }
            }
        }

        // Release the native stream on the thread that opened it.
        drop(reader);
        self.running.store(false, Ordering::SeqCst);
        *self.state.lock() = SourceState::Stopped;

        if let (Some(error), Some(hook)) = (terminated, self.on_terminated.as_ref()) {
            hook(self.role, &error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{wait_until, ScriptedBackend, Step};
    use std::sync::atomic::AtomicUsize;

    fn spec() -> StreamSpec {
        StreamSpec {
            sample_rate: 1000,
            chunk_size: 10,
        }
    }

    fn source(backend: ScriptedBackend) -> (CaptureSource<ScriptedBackend>, ChunkBuffer) {
        let buffer = SharedRingBuffer::new(100);
        let source = CaptureSource::new(backend, None, spec(), buffer.clone());
        (source, buffer)
    }

    #[test]
    fn pushes_chunks_into_buffer() {
        let backend = ScriptedBackend::microphone(vec![Step::mono(10), Step::mono(10), Step::mono(10)]);
        let (mut source, buffer) = source(backend);

        source.start().unwrap();
        assert!(wait_until(|| buffer.len() == 3));
        assert_eq!(source.state(), SourceState::Running);

        source.stop();
        let seqs: Vec<u64> = buffer.snapshot().items.iter().map(|c| c.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn open_failure_is_device_unavailable() {
        let backend = ScriptedBackend::microphone(vec![]).failing_open("device in use");
        let (mut source, _buffer) = source(backend);

        let err = source.start().unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(source.state(), SourceState::Stopped);
    }

    #[test]
    fn stop_is_idempotent_and_releases_stream() {
        let backend = ScriptedBackend::microphone(vec![Step::mono(10)]);
        let closed = backend.closed_counter();
        let (mut source, _buffer) = source(backend);

        source.start().unwrap();
        source.stop();
        assert_eq!(source.state(), SourceState::Stopped);
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        source.stop();
        assert_eq!(source.state(), SourceState::Stopped);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_errors_do_not_stop_the_loop() {
        let backend = ScriptedBackend::microphone(vec![
            Step::mono(10),
            Step::Transient("overflow".into()),
            Step::mono(10),
        ]);
        let (mut source, buffer) = source(backend);

        source.start().unwrap();
        assert!(wait_until(|| source.counters().chunks() == 2));
        assert_eq!(buffer.len(), 2);
        assert_eq!(source.state(), SourceState::Running);
        assert_eq!(source.counters().read_errors(), 1);
        assert_eq!(source.format(), "scripted @ 1000 Hz");
        source.stop();
    }

    #[test]
    fn termination_stops_source_and_fires_hook() {
        let backend = ScriptedBackend::microphone(vec![Step::mono(10), Step::Terminate("unplugged".into())]);
        let (mut source, buffer) = source(backend);

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_hook = Arc::clone(&fired);
        source.set_termination_hook(Arc::new(move |role: SourceRole, err: &CaptureError| {
            assert_eq!(role, SourceRole::Microphone);
            assert!(matches!(err, CaptureError::StreamTerminated(_)));
            fired_hook.fetch_add(1, Ordering::SeqCst);
        }));

        source.start().unwrap();
        assert!(wait_until(|| fired.load(Ordering::SeqCst) == 1));
        assert_eq!(source.state(), SourceState::Stopped);
        assert_eq!(buffer.len(), 1);

        // A stopped source can be started again.
        source.stop();
        source.start().unwrap();
        source.stop();
    }

    #[test]
    fn starting_twice_is_rejected() {
        let backend = ScriptedBackend::microphone(vec![]);
        let (mut source, _buffer) = source(backend);

        source.start().unwrap();
        assert!(matches!(source.start(), Err(CaptureError::ConfigurationFailed(_))));
        source.stop();
    }

    #[test]
    fn stop_signal_ends_loop_without_join() {
        let backend = ScriptedBackend::microphone(vec![]);
        let (mut source, _buffer) = source(backend);

        source.start().unwrap();
        source.stop_signal().request_stop();
        assert!(wait_until(|| source.state() == SourceState::Stopped));
        source.stop();
    }
}
