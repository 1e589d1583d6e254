//! Stream format negotiation.
//!
//! Prefers the configured sample rate in 16-bit integer format with the
//! fewest channels, since that is what ends up in the file. Anything else
//! the device offers is accepted and normalized in the core.

use cpal::traits::DeviceTrait;
use cpal::{SampleRate, SupportedStreamConfig, SupportedStreamConfigRange};

use loopback_core::models::error::CaptureError;

fn format_rank(format: cpal::SampleFormat) -> u8 {
    match format {
        cpal::SampleFormat::I16 => 0,
        cpal::SampleFormat::F32 => 1,
        _ => 2,
    }
}

/// Best range that can run at `sample_rate`, pinned to that rate.
pub fn pick_config(ranges: &[SupportedStreamConfigRange], sample_rate: u32) -> Option<SupportedStreamConfig> {
    ranges
        .iter()
        .filter(|r| r.min_sample_rate().0 <= sample_rate && sample_rate <= r.max_sample_rate().0)
        .filter(|r| r.channels() > 0)
        .min_by_key(|r| (format_rank(r.sample_format()), r.channels()))
        .map(|r| r.clone().with_sample_rate(SampleRate(sample_rate)))
}

/// Input config for `device`: the preferred match at `sample_rate`, else the
/// device default.
pub fn input_config(device: &cpal::Device, sample_rate: u32) -> Result<SupportedStreamConfig, CaptureError> {
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map(|configs| configs.collect())
        .unwrap_or_default();

    if let Some(config) = pick_config(&ranges, sample_rate) {
        return Ok(config);
    }

    log::info!("device cannot run at {} Hz; using its default input config", sample_rate);
    device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to query input config: {}", e)))
}

/// Config for capturing what an output device plays. Loopback must match the
/// device mix format, so the default output config is used as is.
pub fn output_loopback_config(device: &cpal::Device) -> Result<SupportedStreamConfig, CaptureError> {
    device
        .default_output_config()
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to query output config: {}", e)))
}
