use anyhow::{Result, anyhow};

use crate::traits::{DoneCallback, PlaybackBackend, PlaybackHandle};

pub struct DummyBackend;

impl DummyBackend {
    pub fn new() -> Result<Self> {
        Err(anyhow!(
            "Audio playback is not available in this build (missing 'backend-rodio' feature)"
        ))
    }
}

impl PlaybackBackend for DummyBackend {
    fn play(&self, _audio: Vec<u8>, _on_done: DoneCallback) -> Result<Box<dyn PlaybackHandle>> {
        Err(anyhow!("Audio playback is not available"))
    }
}
