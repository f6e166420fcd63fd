//! Wire types for the stream-input websocket protocol

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Voice tuning parameters sent with the opening frame.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.8,
        }
    }
}

/// One outbound frame.
///
/// An utterance is three frames: an opening frame carrying the voice
/// settings and API key with a single-space text, the utterance text with
/// `try_trigger_generation` set, and an empty-text closing frame.
#[derive(Clone, Debug, Serialize)]
pub struct StreamInput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xi_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub try_trigger_generation: Option<bool>,
}

impl StreamInput {
    pub fn bos(settings: VoiceSettings, api_key: impl Into<String>) -> Self {
        Self {
            text: " ".to_string(),
            voice_settings: Some(settings),
            xi_api_key: Some(api_key.into()),
            try_trigger_generation: None,
        }
    }

    /// The utterance itself. The service expects a trailing space to treat
    /// the text as a complete chunk.
    pub fn text(text: &str) -> Self {
        Self {
            text: format!("{text} "),
            voice_settings: None,
            xi_api_key: None,
            try_trigger_generation: Some(true),
        }
    }

    pub fn eos() -> Self {
        Self {
            text: String::new(),
            voice_settings: None,
            xi_api_key: None,
            try_trigger_generation: None,
        }
    }
}

/// One inbound frame. Audio arrives base64-encoded alongside character
/// alignment maps; the service marks the last frame of an utterance with
/// `isFinal`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFrame {
    pub audio: Option<String>,
    pub is_final: Option<bool>,
    pub alignment: Option<serde_json::Value>,
    pub normalized_alignment: Option<serde_json::Value>,
}

impl StreamFrame {
    /// Frames without populated alignment maps carry no playable audio;
    /// the service sends them around generation boundaries.
    pub fn has_alignment(&self) -> bool {
        fn populated(value: &Option<serde_json::Value>) -> bool {
            value
                .as_ref()
                .and_then(|v| v.as_object())
                .is_some_and(|map| !map.is_empty())
        }
        populated(&self.alignment) && populated(&self.normalized_alignment)
    }

    /// Decode this frame's audio payload, if it has one worth playing.
    pub fn decode_audio(&self) -> Option<Vec<u8>> {
        if !self.has_alignment() {
            return None;
        }
        let audio = self.audio.as_deref()?;
        if audio.is_empty() {
            return None;
        }
        match general_purpose::STANDARD.decode(audio) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Unable to decode base64 audio payload: {e}");
                None
            }
        }
    }
}
