use anyhow::Result;

use crate::types::PlaybackOutcome;

/// Completion callback for one fragment. Fired exactly once.
pub type DoneCallback = Box<dyn FnOnce(PlaybackOutcome) + Send>;

/// Trait for backends that turn one encoded audio fragment into sound.
///
/// `play` returns `Err` when the bytes cannot be decoded; `on_done` is never
/// invoked in that case. On success the backend invokes `on_done` exactly
/// once, from another thread, after `play` has returned - on natural finish,
/// on a mid-playback decode failure, or after a halt.
pub trait PlaybackBackend: Send + Sync {
    fn play(&self, audio: Vec<u8>, on_done: DoneCallback) -> Result<Box<dyn PlaybackHandle>>;
}

/// Handle to the fragment currently producing sound.
pub trait PlaybackHandle: Send {
    /// Cut the sound immediately. The backend still delivers its completion
    /// callback afterwards; callers decide whether it still matters.
    fn halt(&mut self);
}
