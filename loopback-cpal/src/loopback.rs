//! cpal system-audio backend.
//!
//! On Windows an input stream is opened on the output device itself, which
//! WASAPI serves in loopback mode and which needs no permissions. Elsewhere
//! a monitor/loopback input device stands in for the output.
//!
//! A loopback stream may deliver nothing while no audio is playing; the
//! reader's poll timeout keeps `stop` responsive regardless.

use loopback_core::models::audio_models::SourceRole;
use loopback_core::models::chunk::StreamSpec;
use loopback_core::models::error::CaptureError;
use loopback_core::traits::capture_backend::{CaptureBackend, ChunkReader};

use crate::devices::{self, LoopbackKind};
use crate::format_select;
use crate::stream::CpalChunkReader;

/// System output capture on the default cpal host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalLoopback;

impl CpalLoopback {
    pub fn new() -> Self {
        Self
    }

    /// Whether a default loopback device can be found.
    pub fn is_available(&self) -> bool {
        devices::resolve_loopback_device(&cpal::default_host(), None).is_ok()
    }
}

impl CaptureBackend for CpalLoopback {
    fn role(&self) -> SourceRole {
        SourceRole::SystemLoopback
    }

    fn open(&self, device_id: Option<&str>, spec: &StreamSpec) -> Result<Box<dyn ChunkReader>, CaptureError> {
        let host = cpal::default_host();
        let (device, kind) = devices::resolve_loopback_device(&host, device_id)?;
        let config = match kind {
            LoopbackKind::OutputLoopback => format_select::output_loopback_config(&device)?,
            LoopbackKind::MonitorInput => format_select::input_config(&device, spec.sample_rate)?,
        };

        let reader = CpalChunkReader::open(&device, config, spec)?;
        log::debug!("loopback stream open ({:?}): {}", kind, reader.describe());
        Ok(Box::new(reader))
    }
}
