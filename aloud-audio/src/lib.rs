//! Streaming audio playback for aloud
//!
//! This crate provides:
//! - `StreamPlayer` - Gapless sequential playback of streamed audio fragments
//! - `PlaybackBackend` / `PlaybackHandle` - The seam to the audio subsystem
//! - Audio output via `rodio` (feature: `backend-rodio`)

pub mod player;
pub mod traits;
pub mod types;

#[cfg(feature = "backend-rodio")]
pub mod rodio_backend;

#[cfg(not(feature = "backend-rodio"))]
pub mod dummy_backend;

// Re-export types
pub use player::StreamPlayer;
pub use traits::{DoneCallback, PlaybackBackend, PlaybackHandle};
pub use types::PlaybackOutcome;

// Default backend exports
#[cfg(feature = "backend-rodio")]
pub use rodio_backend::RodioBackend as AudioBackend;

#[cfg(not(feature = "backend-rodio"))]
pub use dummy_backend::DummyBackend as AudioBackend;
