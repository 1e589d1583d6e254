//! Audible "recording saved" cue played through rodio.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use rodio::{Decoder, OutputStream, Sink};
use thiserror::Error;

use loopback_core::traits::completion_cue::CompletionCue;

#[derive(Debug, Error)]
pub enum CueError {
    #[error("failed to open cue file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode cue file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("failed to open audio output: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("failed to create audio sink: {0}")]
    Sink(#[from] rodio::PlayError),
}

/// Plays a sound file on the default output device.
///
/// Playback runs on a detached thread so the save path never waits on it.
#[derive(Debug, Clone)]
pub struct SoundFileCue {
    path: PathBuf,
}

impl SoundFileCue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CompletionCue for SoundFileCue {
    fn play(&self) {
        let path = self.path.clone();
        let spawned = thread::Builder::new()
            .name("completion-cue".into())
            .spawn(move || {
                if let Err(e) = play_file(&path) {
                    log::warn!("completion cue not played: {}", e);
                }
            });
        if let Err(e) = spawned {
            log::warn!("failed to spawn completion cue thread: {}", e);
        }
    }
}

/// Decode `path` and play it to the end on the default output.
pub fn play_file(path: &Path) -> Result<(), CueError> {
    let file = File::open(path).map_err(|source| CueError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let source = Decoder::new(BufReader::new(file))?;

    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
