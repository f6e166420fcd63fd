//! Per-utterance websocket session against the stream-input endpoint
//!
//! Each utterance gets its own connection: send the three-frame handshake,
//! then read frames until the service flags the final one. Audio payloads
//! are handed to the caller over an event channel; the socket lives on a
//! dedicated thread because reads block.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use tungstenite::{Message, WebSocket};

use crate::api::{StreamFrame, StreamInput, VoiceSettings};

/// Connection parameters for one TTS session.
#[derive(Clone, Debug)]
pub struct TtsConfig {
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
}

impl TtsConfig {
    pub fn stream_url(&self) -> String {
        format!(
            "wss://api.elevenlabs.io/v1/text-to-speech/{}/stream-input?model_id={}",
            self.voice_id, self.model_id
        )
    }

    pub fn fetch_url(&self) -> String {
        format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}/stream",
            self.voice_id
        )
    }
}

/// Events produced while a session drains the service's response.
#[derive(Debug)]
pub enum SessionEvent {
    /// One decoded audio fragment, ready for the playback queue.
    Audio(Vec<u8>),
    /// The service marked the utterance complete; the socket is closed.
    /// Playback keeps draining on its own - this only ends the connection.
    Final,
    /// The socket closed without a final marker.
    Closed,
    /// The session died; no further events follow.
    Error(String),
}

/// Open a session, push `text` through it, and return the event stream.
///
/// The connection and the three-frame handshake happen before this returns,
/// so connection errors surface to the caller; everything after arrives on
/// the channel. This blocks on the connect - call it off the async runtime.
pub fn stream_speech(cfg: &TtsConfig, text: &str) -> Result<UnboundedReceiver<SessionEvent>> {
    let url = cfg.stream_url();
    info!(voice = %cfg.voice_id, model = %cfg.model_id, "Connecting TTS session");
    let (mut socket, _response) =
        tungstenite::connect(&url).context("Websocket connect failed")?;

    send_frame(&mut socket, &StreamInput::bos(cfg.voice_settings, &cfg.api_key))?;
    send_frame(&mut socket, &StreamInput::text(text))?;
    send_frame(&mut socket, &StreamInput::eos())?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_frames(socket, event_tx));

    Ok(event_rx)
}

fn read_frames<S: Read + Write>(mut socket: WebSocket<S>, event_tx: UnboundedSender<SessionEvent>) {
    loop {
        let message = match socket.read() {
            Ok(message) => message,
            Err(e) => {
                error!("TTS session read failed: {e}");
                let _ = event_tx.send(SessionEvent::Error(e.to_string()));
                return;
            }
        };

        match message {
            Message::Text(payload) => {
                let frame: StreamFrame = match serde_json::from_str(&payload) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Skipping unparseable frame: {e}");
                        continue;
                    }
                };

                if let Some(audio) = frame.decode_audio() {
                    debug!(bytes = audio.len(), "Audio fragment received");
                    if event_tx.send(SessionEvent::Audio(audio)).is_err() {
                        // Receiver dropped; stop reading.
                        let _ = socket.close(None);
                        return;
                    }
                } else if frame.audio.is_some() {
                    debug!("Frame carried audio without alignment, skipping");
                }

                if frame.is_final.unwrap_or(false) {
                    info!("Final frame received, closing session");
                    let _ = socket.close(None);
                    let _ = event_tx.send(SessionEvent::Final);
                    return;
                }
            }
            Message::Close(_) => {
                info!("TTS session closed by server");
                let _ = event_tx.send(SessionEvent::Closed);
                return;
            }
            _ => {}
        }
    }
}

fn send_frame<S: Read + Write>(socket: &mut WebSocket<S>, frame: &StreamInput) -> Result<()> {
    let payload = serde_json::to_string(frame).context("Failed to encode outbound frame")?;
    debug!(bytes = payload.len(), "Sending frame");
    socket
        .send(Message::Text(payload))
        .context("Failed to send frame")?;
    Ok(())
}
