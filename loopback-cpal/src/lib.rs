//! # loopback-cpal
//!
//! cpal backend for loopback-core.
//!
//! Provides:
//! - `CpalMicrophone`: microphone capture from a cpal input device
//! - `CpalLoopback`: system audio capture (WASAPI loopback on an output
//!   device, or a monitor/loopback input device on other hosts)
//! - `devices`: input and loopback device enumeration
//! - `SoundFileCue`: rodio-backed "recording saved" sound
//!
//! ## Usage
//! ```ignore
//! use loopback_cpal::{CpalLoopback, CpalMicrophone};
//! use loopback_core::{RecorderConfiguration, RecordingSession};
//!
//! let mut session = RecordingSession::new(CpalMicrophone::new(), CpalLoopback::new(), RecorderConfiguration::default())?;
//! session.start()?;
//! // ... later, on the hotkey:
//! session.snapshot_and_save()?;
//! ```

pub mod cue;
pub mod devices;
pub mod format_select;
pub mod loopback;
pub mod microphone;
pub mod stream;

pub use cue::SoundFileCue;
pub use devices::{list_input_devices, list_loopback_devices};
pub use loopback::CpalLoopback;
pub use microphone::CpalMicrophone;
pub use stream::CpalChunkReader;
