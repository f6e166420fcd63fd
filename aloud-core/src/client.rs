//! One-shot synthesis over plain HTTP
//!
//! Fallback path that downloads the whole clip before playback instead of
//! streaming it frame by frame.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::session::TtsConfig;

/// Fetch the complete clip for `text` as encoded audio bytes.
pub async fn fetch_speech(cfg: &TtsConfig, text: &str) -> Result<Vec<u8>> {
    let body = json!({
        "text": text,
        "model_id": cfg.model_id,
        "voice_settings": cfg.voice_settings,
    });

    let client = reqwest::Client::new();
    let response = client
        .post(cfg.fetch_url())
        .header("xi-api-key", &cfg.api_key)
        .json(&body)
        .send()
        .await
        .context("TTS request failed")?
        .error_for_status()
        .context("TTS request rejected")?;

    let bytes = response
        .bytes()
        .await
        .context("Failed to read TTS response")?;
    info!(bytes = bytes.len(), "Downloaded one-shot clip");
    Ok(bytes.to_vec())
}
