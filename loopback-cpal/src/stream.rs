//! Blocking `ChunkReader` over cpal's push-style callbacks.
//!
//! The audio callback copies each buffer into a bounded channel with
//! `try_send` and never blocks. The capture thread pulls from the channel
//! with a timeout and re-slices the buffers into fixed-size chunks:
//!
//! ```text
//! [cpal callback] → try_send → [sync_channel] → recv_timeout → [ChunkAccumulator] → AudioChunk
//!        └ on_error → [pending errors] ───────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;

use loopback_core::models::chunk::{AudioChunk, SampleData, SampleFormat, StreamSpec};
use loopback_core::models::error::CaptureError;
use loopback_core::traits::capture_backend::ChunkReader;

/// How long `read_chunk` waits for a callback before returning `Ok(None)`.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Callback buffers queued between the audio thread and the capture thread.
const QUEUE_DEPTH: usize = 64;

/// Classify a cpal stream error.
///
/// A vanished device ends the stream; backend hiccups are worth retrying.
pub fn classify_stream_error(err: cpal::StreamError) -> CaptureError {
    match err {
        cpal::StreamError::DeviceNotAvailable => {
            CaptureError::StreamTerminated("audio device is no longer available".into())
        }
        other => CaptureError::TransientRead(other.to_string()),
    }
}

/// Re-slices arbitrarily sized callback buffers into `chunk_size`-frame chunks.
#[derive(Debug)]
pub struct ChunkAccumulator {
    pending: SampleData,
    channels: u16,
    sample_rate: u32,
    chunk_size: usize,
    next_sequence: u64,
}

impl ChunkAccumulator {
    pub fn new(format: SampleFormat, channels: u16, sample_rate: u32, chunk_size: usize) -> Self {
        Self {
            pending: SampleData::empty(format),
            channels: channels.max(1),
            sample_rate,
            chunk_size: chunk_size.max(1),
            next_sequence: 0,
        }
    }

    pub fn push(&mut self, samples: &SampleData) {
        self.pending.extend_from(samples);
    }

    /// Next complete chunk, if enough samples are pending.
    pub fn pop_chunk(&mut self) -> Option<AudioChunk> {
        let samples_per_chunk = self.chunk_size * self.channels as usize;
        if self.pending.len() < samples_per_chunk {
            return None;
        }
        let samples = self.pending.take_front(samples_per_chunk);
        let chunk = AudioChunk::new(samples, self.channels, self.sample_rate, self.next_sequence);
        self.next_sequence += 1;
        Some(chunk)
    }

    /// Samples waiting for a full chunk.
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }
}

/// State shared between the cpal callbacks and the reader.
#[derive(Debug, Default)]
struct CallbackShared {
    dropped: AtomicU64,
    errors: Mutex<VecDeque<CaptureError>>,
}

impl CallbackShared {
    fn report(&self, error: CaptureError) {
        self.errors.lock().push_back(error);
    }

    fn take_error(&self) -> Option<CaptureError> {
        self.errors.lock().pop_front()
    }
}

/// An open cpal input stream read one chunk at a time.
///
/// Dropping the reader drops the stream, which stops the device.
pub struct CpalChunkReader {
    _stream: cpal::Stream,
    receiver: Receiver<SampleData>,
    shared: Arc<CallbackShared>,
    accumulator: ChunkAccumulator,
    description: String,
}

impl CpalChunkReader {
    /// Build and start an input stream on `device` with `supported`.
    pub fn open(
        device: &cpal::Device,
        supported: cpal::SupportedStreamConfig,
        spec: &StreamSpec,
    ) -> Result<Self, CaptureError> {
        let config: cpal::StreamConfig = supported.config();
        let sample_format = supported.sample_format();
        let (sender, receiver) = mpsc::sync_channel(QUEUE_DEPTH);
        let shared = Arc::new(CallbackShared::default());

        let stream = match sample_format {
            cpal::SampleFormat::I16 => {
                build_stream::<i16, _>(device, &config, sender, &shared, |d| SampleData::I16(d.to_vec()))
            }
            cpal::SampleFormat::F32 => {
                build_stream::<f32, _>(device, &config, sender, &shared, |d| SampleData::F32(d.to_vec()))
            }
            cpal::SampleFormat::I32 => build_stream::<i32, _>(device, &config, sender, &shared, to_f32_samples::<i32>),
            cpal::SampleFormat::U16 => build_stream::<u16, _>(device, &config, sender, &shared, to_f32_samples::<u16>),
            cpal::SampleFormat::U8 => build_stream::<u8, _>(device, &config, sender, &shared, to_f32_samples::<u8>),
            cpal::SampleFormat::I8 => build_stream::<i8, _>(device, &config, sender, &shared, to_f32_samples::<i8>),
            cpal::SampleFormat::F64 => build_stream::<f64, _>(device, &config, sender, &shared, to_f32_samples::<f64>),
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to start input stream: {}", e)))?;

        let delivered_format = match sample_format {
            cpal::SampleFormat::I16 => SampleFormat::I16,
            _ => SampleFormat::F32,
        };
        let device_name = device.name().unwrap_or_else(|_| "unknown device".into());
        let description = format!(
            "{}: {} ch {:?} @ {} Hz",
            device_name, config.channels, sample_format, config.sample_rate.0
        );

        Ok(Self {
            _stream: stream,
            receiver,
            shared,
            accumulator: ChunkAccumulator::new(
                delivered_format,
                config.channels,
                config.sample_rate.0,
                spec.chunk_size,
            ),
            description,
        })
    }
}

impl ChunkReader for CpalChunkReader {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, CaptureError> {
        if let Some(error) = self.shared.take_error() {
            return Err(error);
        }

        let dropped = self.shared.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            return Err(CaptureError::TransientRead(format!(
                "capture fell behind; {} callback buffers dropped",
                dropped
            )));
        }

        if let Some(chunk) = self.accumulator.pop_chunk() {
            return Ok(Some(chunk));
        }

        match self.receiver.recv_timeout(POLL_INTERVAL) {
            Ok(samples) => {
                self.accumulator.push(&samples);
                Ok(self.accumulator.pop_chunk())
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CaptureError::StreamTerminated("audio callback disconnected".into()))
            }
        }
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sender: SyncSender<SampleData>,
    shared: &Arc<CallbackShared>,
    convert: F,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    F: Fn(&[T]) -> SampleData + Send + 'static,
{
    let data_shared = Arc::clone(shared);
    let error_shared = Arc::clone(shared);

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if sender.try_send(convert(data)).is_err() {
                data_shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
        },
        move |err: cpal::StreamError| {
            log::warn!("input stream error: {}", err);
            error_shared.report(classify_stream_error(err));
        },
        None,
    )
}

fn to_f32_samples<T>(data: &[T]) -> SampleData
where
    T: Sample,
    f32: FromSample<T>,
{
    SampleData::F32(data.iter().map(|&s| s.to_sample::<f32>()).collect())
}
