//! Audio device enumeration and lookup through cpal.
//!
//! Device ids are the names cpal reports, so a configured id survives
//! restarts as long as the device keeps its name.
//!
//! System audio is captured one of two ways:
//! - Windows (WASAPI): an input stream opened on an *output* device records
//!   what that device is playing.
//! - Elsewhere: a virtual input such as a PulseAudio/PipeWire "Monitor of ..."
//!   source or a loopback driver (BlackHole, Soundflower).

use cpal::traits::{DeviceTrait, HostTrait};
use thiserror::Error;

use loopback_core::models::audio_models::{InputDeviceInfo, LoopbackDeviceInfo};
use loopback_core::models::error::CaptureError;

/// Name fragments that mark an input device as a loopback of system output.
const LOOPBACK_NAME_HINTS: [&str; 5] = ["monitor", "loopback", "blackhole", "soundflower", "stereo mix"];

#[derive(Debug, Error)]
pub enum DeviceLookupError {
    #[error("failed to enumerate audio devices: {0}")]
    Enumerate(#[from] cpal::DevicesError),
    #[error("audio device not found: {0}")]
    NotFound(String),
    #[error("no default {0} device")]
    NoDefault(&'static str),
}

impl From<DeviceLookupError> for CaptureError {
    fn from(e: DeviceLookupError) -> Self {
        CaptureError::DeviceUnavailable(e.to_string())
    }
}

/// How a resolved loopback device delivers system audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopbackKind {
    /// Output device captured through WASAPI loopback.
    OutputLoopback,
    /// Virtual input device mirroring system output.
    MonitorInput,
}

/// Whether `name` looks like a virtual input that mirrors system output.
pub fn looks_like_loopback(name: &str) -> bool {
    let lower = name.to_lowercase();
    LOOPBACK_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

/// List capture-capable input devices on the default host.
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.input_devices().map_err(DeviceLookupError::from)? {
        let Ok(name) = device.name() else {
            continue;
        };
        let max_input_channels = max_input_channels(&device);
        if max_input_channels == 0 {
            continue;
        }
        devices.push(InputDeviceInfo {
            id: name.clone(),
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            max_input_channels,
        });
    }
    log::debug!("found {} input devices", devices.len());
    Ok(devices)
}

/// List devices whose output can be recorded as system audio.
pub fn list_loopback_devices() -> Result<Vec<LoopbackDeviceInfo>, CaptureError> {
    let host = cpal::default_host();
    let host_api = host.id().name().to_string();

    let mut devices = Vec::new();
    for (device, _) in loopback_candidates(&host)? {
        let Ok(name) = device.name() else {
            continue;
        };
        devices.push(LoopbackDeviceInfo {
            id: name.clone(),
            name,
            host_api: host_api.clone(),
            is_default: false,
        });
    }

    if let Ok((default_device, _)) = resolve_loopback_device(&host, None) {
        if let Ok(default_name) = default_device.name() {
            for info in devices.iter_mut() {
                info.is_default = info.id == default_name;
            }
        }
    }

    log::debug!("found {} loopback devices on {}", devices.len(), host_api);
    Ok(devices)
}

/// Find the microphone to open: the named input device, or the default.
pub fn resolve_input_device(host: &cpal::Host, device_id: Option<&str>) -> Result<cpal::Device, DeviceLookupError> {
    match device_id {
        Some(id) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or_else(|| DeviceLookupError::NotFound(id.to_string())),
        None => host.default_input_device().ok_or(DeviceLookupError::NoDefault("input")),
    }
}

/// Find the system-audio device to open: the named loopback candidate, or
/// the platform default.
pub fn resolve_loopback_device(
    host: &cpal::Host,
    device_id: Option<&str>,
) -> Result<(cpal::Device, LoopbackKind), DeviceLookupError> {
    if let Some(id) = device_id {
        return loopback_candidates(host)?
            .into_iter()
            .find(|(d, _)| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or_else(|| DeviceLookupError::NotFound(id.to_string()));
    }
    default_loopback_device(host)
}

#[cfg(target_os = "windows")]
fn loopback_candidates(host: &cpal::Host) -> Result<Vec<(cpal::Device, LoopbackKind)>, DeviceLookupError> {
    let mut candidates: Vec<_> = host
        .output_devices()?
        .map(|d| (d, LoopbackKind::OutputLoopback))
        .collect();
    candidates.extend(monitor_inputs(host)?);
    Ok(candidates)
}

#[cfg(not(target_os = "windows"))]
fn loopback_candidates(host: &cpal::Host) -> Result<Vec<(cpal::Device, LoopbackKind)>, DeviceLookupError> {
    monitor_inputs(host)
}

fn monitor_inputs(host: &cpal::Host) -> Result<Vec<(cpal::Device, LoopbackKind)>, DeviceLookupError> {
    Ok(host
        .input_devices()?
        .filter(|d| d.name().map(|n| looks_like_loopback(&n)).unwrap_or(false))
        .map(|d| (d, LoopbackKind::MonitorInput))
        .collect())
}

#[cfg(target_os = "windows")]
fn default_loopback_device(host: &cpal::Host) -> Result<(cpal::Device, LoopbackKind), DeviceLookupError> {
    host.default_output_device()
        .map(|d| (d, LoopbackKind::OutputLoopback))
        .ok_or(DeviceLookupError::NoDefault("output"))
}

#[cfg(not(target_os = "windows"))]
fn default_loopback_device(host: &cpal::Host) -> Result<(cpal::Device, LoopbackKind), DeviceLookupError> {
    monitor_inputs(host)?
        .into_iter()
        .next()
        .ok_or(DeviceLookupError::NoDefault("loopback"))
}

fn max_input_channels(device: &cpal::Device) -> u16 {
    device
        .supported_input_configs()
        .ok()
        .and_then(|configs| configs.map(|c| c.channels()).max())
        .or_else(|| device.default_input_config().ok().map(|c| c.channels()))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_sources_are_loopback() {
        assert!(looks_like_loopback("Monitor of Built-in Audio Analog Stereo"));
        assert!(looks_like_loopback("BlackHole 2ch"));
        assert!(looks_like_loopback("Stereo Mix (Realtek Audio)"));
        assert!(!looks_like_loopback("MacBook Pro Microphone"));
        assert!(!looks_like_loopback("USB Audio Device"));
    }

    #[test]
    fn lookup_errors_become_device_unavailable() {
        let err: CaptureError = DeviceLookupError::NotFound("Headset".into()).into();
        assert_eq!(err, CaptureError::DeviceUnavailable("audio device not found: Headset".into()));

        let err: CaptureError = DeviceLookupError::NoDefault("input").into();
        assert!(matches!(err, CaptureError::DeviceUnavailable(msg) if msg.contains("no default input")));
    }
}
