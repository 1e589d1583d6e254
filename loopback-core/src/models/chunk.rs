use std::fmt;
use std::time::Instant;

/// Sample representation delivered by a device stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    I16,
    F32,
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I16 => f.write_str("i16"),
            Self::F32 => f.write_str("f32"),
        }
    }
}

/// Interleaved raw samples in the device's native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl SampleData {
    pub fn empty(format: SampleFormat) -> Self {
        match format {
            SampleFormat::I16 => Self::I16(Vec::new()),
            SampleFormat::F32 => Self::F32(Vec::new()),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            Self::I16(_) => SampleFormat::I16,
            Self::F32(_) => SampleFormat::F32,
        }
    }

    /// Number of individual samples (not frames).
    pub fn len(&self) -> usize {
        match self {
            Self::I16(s) => s.len(),
            Self::F32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the first `count` samples.
    ///
    /// Returns fewer if fewer are held.
    pub fn take_front(&mut self, count: usize) -> SampleData {
        match self {
            Self::I16(s) => {
                let n = count.min(s.len());
                Self::I16(s.drain(..n).collect())
            }
            Self::F32(s) => {
                let n = count.min(s.len());
                Self::F32(s.drain(..n).collect())
            }
        }
    }

    /// Append samples of the same format.
    ///
    /// Mismatched formats are converted to `self`'s representation.
    pub fn extend_from(&mut self, other: &SampleData) {
        match (self, other) {
            (Self::I16(dst), Self::I16(src)) => dst.extend_from_slice(src),
            (Self::F32(dst), Self::F32(src)) => dst.extend_from_slice(src),
            (Self::I16(dst), Self::F32(src)) => {
                dst.extend(src.iter().map(|&s| crate::processing::normalizer::f32_to_i16(s)))
            }
            (Self::F32(dst), Self::I16(src)) => {
                dst.extend(src.iter().map(|&s| s as f32 / i16::MAX as f32))
            }
        }
    }
}

/// Parameters a backend is asked to open its stream with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    /// Requested sample rate in Hz. Backends may deliver another rate when
    /// the device cannot run at this one; chunks carry the actual rate.
    pub sample_rate: u32,
    /// Frames per chunk.
    pub chunk_size: usize,
}

/// One fixed-size block of samples read from a device.
///
/// Immutable once produced; ring buffers hold it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: SampleData,
    pub channels: u16,
    pub sample_rate: u32,
    /// Monotonic per-source sequence number.
    pub sequence: u64,
    pub captured_at: Instant,
}

impl AudioChunk {
    pub fn new(samples: SampleData, channels: u16, sample_rate: u32, sequence: u64) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    /// Duration of the chunk in seconds at its own sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}
