//! cpal microphone backend.
//!
//! Opens an input device (named or default) at the configured rate when it
//! can, otherwise at the device default. Delivers i16 or f32 chunks.

use cpal::traits::HostTrait;

use loopback_core::models::audio_models::SourceRole;
use loopback_core::models::chunk::StreamSpec;
use loopback_core::models::error::CaptureError;
use loopback_core::traits::capture_backend::{CaptureBackend, ChunkReader};

use crate::devices;
use crate::format_select;
use crate::stream::CpalChunkReader;

/// Microphone capture on the default cpal host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }

    /// Whether any input device is present.
    pub fn is_available(&self) -> bool {
        cpal::default_host()
            .input_devices()
            .map(|mut devices| devices.next().is_some())
            .unwrap_or(false)
    }
}

impl CaptureBackend for CpalMicrophone {
    fn role(&self) -> SourceRole {
        SourceRole::Microphone
    }

    fn open(&self, device_id: Option<&str>, spec: &StreamSpec) -> Result<Box<dyn ChunkReader>, CaptureError> {
        let host = cpal::default_host();
        let device = devices::resolve_input_device(&host, device_id)?;
        let config = format_select::input_config(&device, spec.sample_rate)?;

        let reader = CpalChunkReader::open(&device, config, spec)?;
        log::debug!("microphone stream open: {}", reader.describe());
        Ok(Box::new(reader))
    }
}
