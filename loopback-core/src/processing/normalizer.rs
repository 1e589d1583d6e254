//! Channel-count, sample-format, and sample-rate reconciliation.
//!
//! Every source is brought to interleaved PCM16 stereo at the target rate so
//! the combiner never sees device-specific formats.

use std::borrow::Borrow;

use crate::models::audio_models::SourceRole;
use crate::models::chunk::{AudioChunk, SampleData};

/// Output channel count of every normalized stream.
pub const NORMALIZED_CHANNELS: u16 = 2;

/// Convert a float sample in `[-1.0, 1.0]` to int16 as `round(sample * 32767)`,
/// clamped to the int16 range.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * i16::MAX as f32).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Interleaved PCM16 stereo samples for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStream {
    pub role: SourceRole,
    pub sample_rate: u32,
    /// `[L0, R0, L1, R1, ...]`
    pub samples: Vec<i16>,
}

impl NormalizedStream {
    pub fn frames(&self) -> usize {
        self.samples.len() / NORMALIZED_CHANNELS as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Little-endian PCM16 byte sequence.
    pub fn pcm_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }
        data
    }
}

/// Pure normalizer from raw captured chunks to [`NormalizedStream`].
#[derive(Debug, Clone)]
pub struct StreamFormatNormalizer {
    pub target_sample_rate: u32,
}

impl StreamFormatNormalizer {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Normalize a temporal sequence of chunks from one source.
    ///
    /// - mono is duplicated into both channels, sample for sample;
    /// - stereo passes through; wider layouts keep their first two channels;
    /// - float samples become `round(s * 32767)` clamped to int16;
    /// - runs of chunks at another rate are linearly resampled to the target.
    pub fn normalize<C: Borrow<AudioChunk>>(&self, chunks: &[C], role: SourceRole) -> NormalizedStream {
        let mut samples = Vec::new();
        let mut run: Vec<i16> = Vec::new();
        let mut run_rate: Option<u32> = None;

        for chunk in chunks {
            let chunk = chunk.borrow();
            if chunk.channels == 0 {
                log::warn!("{} chunk {} has no channels, skipping", role, chunk.sequence);
                continue;
            }

            if run_rate.is_some_and(|rate| rate != chunk.sample_rate) {
                self.flush_run(&mut samples, &mut run, run_rate);
            }
            run_rate = Some(chunk.sample_rate);
            to_stereo_i16(chunk, &mut run);
        }
        self.flush_run(&mut samples, &mut run, run_rate);

        NormalizedStream {
            role,
            sample_rate: self.target_sample_rate,
            samples,
        }
    }

    fn flush_run(&self, out: &mut Vec<i16>, run: &mut Vec<i16>, rate: Option<u32>) {
        if run.is_empty() {
            return;
        }
        match rate {
            Some(rate) if rate != self.target_sample_rate && rate > 0 => {
                out.extend(self.resample_stereo(run, rate));
            }
            _ => out.extend_from_slice(run),
        }
        run.clear();
    }

    /// Linear interpolation resampling for interleaved stereo PCM16.
    ///
    /// Input: `[L0, R0, L1, R1, ...]` at `source_sample_rate`.
    /// Output: `[L0, R0, L1, R1, ...]` at `self.target_sample_rate`.
    pub fn resample_stereo(&self, samples: &[i16], source_sample_rate: u32) -> Vec<i16> {
        if source_sample_rate == self.target_sample_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let frame_count = samples.len() / 2;
        let ratio = self.target_sample_rate as f64 / source_sample_rate as f64;
        let output_frames = (frame_count as f64 * ratio) as usize;
        if output_frames == 0 {
            return Vec::new();
        }

        let mut output = vec![0i16; output_frames * 2];
        for i in 0..output_frames {
            let source_index = i as f64 / ratio;
            let index = source_index as usize;
            let fraction = source_index - index as f64;

            for ch in 0..2usize {
                if index + 1 < frame_count {
                    let a = samples[index * 2 + ch] as f64;
                    let b = samples[(index + 1) * 2 + ch] as f64;
                    output[i * 2 + ch] = (a * (1.0 - fraction) + b * fraction).round() as i16;
                } else if index < frame_count {
                    output[i * 2 + ch] = samples[index * 2 + ch];
                }
            }
        }
        output
    }
}

/// Append one chunk's frames to `out` as interleaved stereo PCM16.
fn to_stereo_i16(chunk: &AudioChunk, out: &mut Vec<i16>) {
    let channels = chunk.channels as usize;
    match &chunk.samples {
        SampleData::I16(s) => push_frames(s, channels, out, |v| v),
        SampleData::F32(s) => push_frames(s, channels, out, f32_to_i16),
    }
}

fn push_frames<T: Copy>(samples: &[T], channels: usize, out: &mut Vec<i16>, convert: impl Fn(T) -> i16) {
    out.reserve(samples.len() / channels * 2);
    for frame in samples.chunks_exact(channels) {
        let left = convert(frame[0]);
        let right = if channels == 1 { left } else { convert(frame[1]) };
        out.push(left);
        out.push(right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_i16(samples: Vec<i16>, rate: u32, seq: u64) -> AudioChunk {
        AudioChunk::new(SampleData::I16(samples), 1, rate, seq)
    }

    #[test]
    fn mono_is_duplicated_exactly() {
        let normalizer = StreamFormatNormalizer::new(44100);
        let chunks = vec![mono_i16(vec![1, -2, 300], 44100, 0), mono_i16(vec![i16::MIN], 44100, 1)];

        let out = normalizer.normalize(&chunks, SourceRole::Microphone);

        assert_eq!(out.samples, vec![1, 1, -2, -2, 300, 300, i16::MIN, i16::MIN]);
        assert_eq!(out.frames(), 4);
        assert_eq!(out.role, SourceRole::Microphone);
    }

    #[test]
    fn float_stereo_is_rounded_and_clamped() {
        let normalizer = StreamFormatNormalizer::new(48000);
        let chunk = AudioChunk::new(SampleData::F32(vec![0.0, 1.0, -1.0, 0.5, 1.5, -2.0]), 2, 48000, 0);

        let out = normalizer.normalize(&[chunk], SourceRole::SystemLoopback);

        // round(0.5 * 32767) = round(16383.5) = 16384
        assert_eq!(out.samples, vec![0, 32767, -32767, 16384, 32767, -32768]);
    }

    #[test]
    fn f32_conversion_rule() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(f32_to_i16(10.0), i16::MAX);
        assert_eq!(f32_to_i16(-10.0), i16::MIN);
        assert_eq!(f32_to_i16(0.25), 8192); // 8191.75 rounds up
    }

    #[test]
    fn wide_layouts_keep_front_pair() {
        let normalizer = StreamFormatNormalizer::new(48000);
        let chunk = AudioChunk::new(SampleData::I16(vec![1, 2, 3, 4, 5, 6, 7, 8]), 4, 48000, 0);

        let out = normalizer.normalize(&[chunk], SourceRole::SystemLoopback);

        assert_eq!(out.samples, vec![1, 2, 5, 6]);
    }

    #[test]
    fn mismatched_rate_is_resampled() {
        let normalizer = StreamFormatNormalizer::new(48000);
        let chunk = mono_i16(vec![0; 240], 24000, 0);

        let out = normalizer.normalize(&[chunk], SourceRole::Microphone);

        assert_eq!(out.frames(), 480);
        assert_eq!(out.sample_rate, 48000);
    }

    #[test]
    fn upsample_interpolates_midpoints() {
        let normalizer = StreamFormatNormalizer::new(48000);
        let stereo = vec![0, 0, 1000, -1000];

        let out = normalizer.resample_stereo(&stereo, 24000);

        assert_eq!(out.len(), 8);
        assert_eq!(&out[0..2], &[0, 0]);
        assert_eq!(&out[2..4], &[500, -500]);
        assert_eq!(&out[4..6], &[1000, -1000]);
    }

    #[test]
    fn same_rate_is_passthrough() {
        let normalizer = StreamFormatNormalizer::new(44100);
        let stereo = vec![1, 2, 3, 4];
        assert_eq!(normalizer.resample_stereo(&stereo, 44100), stereo);
    }

    #[test]
    fn empty_input_gives_empty_stream() {
        let normalizer = StreamFormatNormalizer::new(44100);
        let out = normalizer.normalize::<AudioChunk>(&[], SourceRole::Microphone);
        assert!(out.is_empty());
        assert!(out.pcm_bytes().is_empty());
    }

    #[test]
    fn pcm_bytes_are_little_endian() {
        let stream = NormalizedStream {
            role: SourceRole::Microphone,
            sample_rate: 44100,
            samples: vec![1, -1],
        };
        assert_eq!(stream.pcm_bytes(), vec![0x01, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn zero_channel_chunks_are_skipped() {
        let normalizer = StreamFormatNormalizer::new(44100);
        let bad = AudioChunk::new(SampleData::I16(vec![9, 9]), 0, 44100, 0);
        let good = mono_i16(vec![7], 44100, 1);

        let out = normalizer.normalize(&[bad, good], SourceRole::Microphone);
        assert_eq!(out.samples, vec![7, 7]);
    }
}
