//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// ElevenLabs API key; the ELEVENLABS_API_KEY env var takes precedence
    pub api_key: Option<String>,
    /// Voice to synthesize with
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    /// TTS model id
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Voice stability (0.0 - 1.0)
    #[serde(default = "default_stability")]
    pub stability: f64,
    /// Voice similarity boost (0.0 - 1.0)
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f64,
    /// How often buffered input is flushed to the service, in seconds
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
}

fn default_voice_id() -> String {
    "OiPxMr8b7mL9wBqR0S9n".to_string()
}

fn default_model_id() -> String {
    "eleven_turbo_v2".to_string()
}

fn default_stability() -> f64 {
    0.5
}

fn default_similarity_boost() -> f64 {
    0.8
}

fn default_flush_interval() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            flush_interval_secs: default_flush_interval(),
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        toml::from_str(&content).unwrap_or_default()
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<(), String> {
        let path = PathManager::settings_path().ok_or("Could not determine settings path")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(&path, content).map_err(|e| format!("Failed to write settings: {}", e))?;
        Ok(())
    }

    /// Get the API key, preferring the environment over the settings file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_expectations() {
        let settings = Settings::default();
        assert_eq!(settings.model_id, "eleven_turbo_v2");
        assert_eq!(settings.stability, 0.5);
        assert_eq!(settings.similarity_boost, 0.8);
        assert_eq!(settings.flush_interval_secs, 5);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn toml_round_trip() {
        let mut settings = Settings::default();
        settings.api_key = Some("key".to_string());
        settings.voice_id = "custom-voice".to_string();
        settings.flush_interval_secs = 2;

        let content = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&content).unwrap();

        assert_eq!(parsed.api_key.as_deref(), Some("key"));
        assert_eq!(parsed.voice_id, "custom-voice");
        assert_eq!(parsed.flush_interval_secs, 2);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Settings = toml::from_str("voice_id = \"v\"").unwrap();
        assert_eq!(parsed.voice_id, "v");
        assert_eq!(parsed.model_id, "eleven_turbo_v2");
        assert_eq!(parsed.flush_interval_secs, 5);
    }
}
