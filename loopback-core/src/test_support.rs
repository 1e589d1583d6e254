//! In-memory capture backend for exercising sources and sessions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::audio_models::SourceRole;
use crate::models::chunk::{AudioChunk, SampleData, StreamSpec};
use crate::models::error::CaptureError;
use crate::traits::capture_backend::{CaptureBackend, ChunkReader};

/// One scripted result of `read_chunk`.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk { samples: SampleData, channels: u16 },
    Transient(String),
    Terminate(String),
    /// Sleep, then report that no chunk is ready.
    Pause(Duration),
}

impl Step {
    /// Mono i16 chunk of `frames` frames with a ramp of sample values.
    pub fn mono(frames: usize) -> Self {
        Self::Chunk {
            samples: SampleData::I16((0..frames as i16).collect()),
            channels: 1,
        }
    }

    /// Stereo f32 chunk of `frames` frames at a constant level.
    pub fn stereo_f32(frames: usize, level: f32) -> Self {
        Self::Chunk {
            samples: SampleData::F32(vec![level; frames * 2]),
            channels: 2,
        }
    }
}

/// Backend that replays a fixed script, then idles until stopped.
pub struct ScriptedBackend {
    role: SourceRole,
    script: Mutex<VecDeque<Step>>,
    open_error: Option<String>,
    open_delay: Option<Duration>,
    opens: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(role: SourceRole, steps: Vec<Step>) -> Self {
        Self {
            role,
            script: Mutex::new(steps.into()),
            open_error: None,
            open_delay: None,
            opens: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn microphone(steps: Vec<Step>) -> Self {
        Self::new(SourceRole::Microphone, steps)
    }

    pub fn system(steps: Vec<Step>) -> Self {
        Self::new(SourceRole::SystemLoopback, steps)
    }

    pub fn failing_open(mut self, reason: &str) -> Self {
        self.open_error = Some(reason.to_string());
        self
    }

    /// Make `open` take `delay` before it answers.
    pub fn slow_open(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Number of readers dropped so far.
    pub fn closed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }

    pub fn open_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opens)
    }
}

impl CaptureBackend for ScriptedBackend {
    fn role(&self) -> SourceRole {
        self.role
    }

    fn open(&self, _device_id: Option<&str>, spec: &StreamSpec) -> Result<Box<dyn ChunkReader>, CaptureError> {
        if let Some(delay) = self.open_delay {
            thread::sleep(delay);
        }
        if let Some(reason) = &self.open_error {
            return Err(CaptureError::DeviceUnavailable(reason.clone()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let steps = std::mem::take(&mut *self.script.lock());
        Ok(Box::new(ScriptedReader {
            steps,
            sample_rate: spec.sample_rate,
            sequence: 0,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct ScriptedReader {
    steps: VecDeque<Step>,
    sample_rate: u32,
    sequence: u64,
    closed: Arc<AtomicUsize>,
}

impl ChunkReader for ScriptedReader {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, CaptureError> {
        match self.steps.pop_front() {
            Some(Step::Chunk { samples, channels }) => {
                let chunk = AudioChunk::new(samples, channels, self.sample_rate, self.sequence);
                self.sequence += 1;
                Ok(Some(chunk))
            }
            Some(Step::Transient(reason)) => Err(CaptureError::TransientRead(reason)),
            Some(Step::Terminate(reason)) => Err(CaptureError::StreamTerminated(reason)),
            Some(Step::Pause(duration)) => {
                thread::sleep(duration);
                Ok(None)
            }
            None => {
                thread::sleep(Duration::from_millis(1));
                Ok(None)
            }
        }
    }

    fn describe(&self) -> String {
        format!("scripted @ {} Hz", self.sample_rate)
    }
}

impl Drop for ScriptedReader {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` for up to two seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("loopback_core_test_{}_{}", name, uuid::Uuid::new_v4()))
}
