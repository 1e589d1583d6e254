use crate::models::config::CombineMode;
use crate::processing::normalizer::{NormalizedStream, NORMALIZED_CHANNELS};

/// Interleaved PCM16 waveform ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedWaveform {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl CombinedWaveform {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
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

/// Result of combining two streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineOutcome {
    Waveform(CombinedWaveform),
    /// No frames survived truncation; nothing to save.
    Empty,
}

/// Merges two normalized stereo streams into one waveform.
///
/// Both inputs are truncated to the shorter one; nothing is padded.
///
/// - `Concatenate`: `[micL, micR, sysL, sysR]` per frame (4 channels).
/// - `Mix`: `[micL + sysL, micR + sysR]` per frame, saturating at the int16 range.
#[derive(Debug, Clone)]
pub struct Combiner {
    pub mode: CombineMode,
}

impl Combiner {
    pub fn new(mode: CombineMode) -> Self {
        Self { mode }
    }

    pub fn output_channels(&self) -> u16 {
        match self.mode {
            CombineMode::Concatenate => NORMALIZED_CHANNELS * 2,
            CombineMode::Mix => NORMALIZED_CHANNELS,
        }
    }

    pub fn combine(&self, mic: &NormalizedStream, system: &NormalizedStream) -> CombineOutcome {
        let frame_count = mic.frames().min(system.frames());
        if frame_count == 0 {
            return CombineOutcome::Empty;
        }

        let samples = match self.mode {
            CombineMode::Concatenate => concatenate(&mic.samples, &system.samples, frame_count),
            CombineMode::Mix => mix(&mic.samples, &system.samples, frame_count),
        };

        CombineOutcome::Waveform(CombinedWaveform {
            samples,
            channels: self.output_channels(),
            sample_rate: mic.sample_rate,
        })
    }
}

fn concatenate(mic: &[i16], system: &[i16], frame_count: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(frame_count * 4);
    for (m, s) in mic.chunks_exact(2).zip(system.chunks_exact(2)).take(frame_count) {
        out.extend_from_slice(m);
        out.extend_from_slice(s);
    }
    out
}

fn mix(mic: &[i16], system: &[i16], frame_count: usize) -> Vec<i16> {
    mic[..frame_count * 2]
        .iter()
        .zip(&system[..frame_count * 2])
        .map(|(&m, &s)| m.saturating_add(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::SourceRole;

    fn stream(role: SourceRole, samples: Vec<i16>) -> NormalizedStream {
        NormalizedStream {
            role,
            sample_rate: 44100,
            samples,
        }
    }

    #[test]
    fn concatenate_interleaves_four_channels() {
        let combiner = Combiner::new(CombineMode::Concatenate);
        let mic = stream(SourceRole::Microphone, vec![1, 1, 2, 2]);
        let sys = stream(SourceRole::SystemLoopback, vec![10, 11, 20, 21]);

        let CombineOutcome::Waveform(wave) = combiner.combine(&mic, &sys) else {
            panic!("expected waveform");
        };

        assert_eq!(wave.channels, 4);
        assert_eq!(wave.samples, vec![1, 1, 10, 11, 2, 2, 20, 21]);
        assert_eq!(wave.frames(), 2);
    }

    #[test]
    fn output_truncates_to_shorter_stream() {
        for mode in [CombineMode::Concatenate, CombineMode::Mix] {
            let combiner = Combiner::new(mode);
            let mic = stream(SourceRole::Microphone, vec![1; 2 * 7]);
            let sys = stream(SourceRole::SystemLoopback, vec![2; 2 * 3]);

            let CombineOutcome::Waveform(wave) = combiner.combine(&mic, &sys) else {
                panic!("expected waveform");
            };
            assert_eq!(wave.frames(), 3);

            let CombineOutcome::Waveform(wave) = combiner.combine(&sys, &mic) else {
                panic!("expected waveform");
            };
            assert_eq!(wave.frames(), 3);
        }
    }

    #[test]
    fn mix_sums_and_saturates() {
        let combiner = Combiner::new(CombineMode::Mix);
        let mic = stream(SourceRole::Microphone, vec![100, -100, 30000, -30000]);
        let sys = stream(SourceRole::SystemLoopback, vec![5, 5, 10000, -10000]);

        let CombineOutcome::Waveform(wave) = combiner.combine(&mic, &sys) else {
            panic!("expected waveform");
        };

        assert_eq!(wave.channels, 2);
        assert_eq!(wave.samples, vec![105, -95, i16::MAX, i16::MIN]);
    }

    #[test]
    fn empty_inputs_are_empty_recording() {
        let combiner = Combiner::new(CombineMode::Concatenate);
        let empty_mic = stream(SourceRole::Microphone, vec![]);
        let empty_sys = stream(SourceRole::SystemLoopback, vec![]);
        assert_eq!(combiner.combine(&empty_mic, &empty_sys), CombineOutcome::Empty);

        let sys = stream(SourceRole::SystemLoopback, vec![1, 2]);
        assert_eq!(combiner.combine(&empty_mic, &sys), CombineOutcome::Empty);
    }

    #[test]
    fn duration_and_bytes() {
        let wave = CombinedWaveform {
            samples: vec![0; 44100 * 2],
            channels: 2,
            sample_rate: 44100,
        };
        assert!((wave.duration_secs() - 1.0).abs() < 1e-9);
        assert_eq!(wave.pcm_bytes().len(), 44100 * 4);
    }
}
