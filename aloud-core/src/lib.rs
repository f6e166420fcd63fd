//! Protocol plumbing for the aloud TTS client
//!
//! This crate provides:
//! - Wire types for the ElevenLabs stream-input protocol
//! - `stream_speech` - A per-utterance duplex session feeding audio events
//! - `fetch_speech` - One-shot non-streaming synthesis over HTTP
//!
//! Audio payloads leave this crate as opaque byte fragments; decoding and
//! playback are `aloud-audio`'s concern.

pub mod api;
pub mod client;
pub mod session;

pub use api::{StreamFrame, StreamInput, VoiceSettings};
pub use client::fetch_speech;
pub use session::{SessionEvent, TtsConfig, stream_speech};
