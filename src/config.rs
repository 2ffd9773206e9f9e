//! Application configuration: a JSON file in the data directory plus environment overrides

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::admin::Passcodes;
use crate::banner::BannerTiming;
use crate::error::ConfigError;
use crate::gemini::GeminiSettings;
use crate::paths::get_config_path;
use crate::upload::CloudinaryConfig;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const CLOUDINARY_CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const CLOUDINARY_UPLOAD_PRESET_ENV: &str = "CLOUDINARY_UPLOAD_PRESET";
pub const OPENAI_TRANSCRIPTION_API_KEY_ENV: &str = "OPENAI_TRANSCRIPTION_API_KEY";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_search_grounding")]
    pub search_grounding: bool,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_transcription_api_key: Option<String>,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub passcodes: Passcodes,
    #[serde(default)]
    pub banner: BannerTiming,
    // Legacy field for migration
    #[serde(skip_serializing, default)]
    api_key: Option<String>,
}

fn default_chat_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_search_grounding() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            search_grounding: default_search_grounding(),
            gemini_api_key: None,
            openai_transcription_api_key: None,
            cloudinary: CloudinaryConfig::default(),
            passcodes: Passcodes::default(),
            banner: BannerTiming::default(),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Reads the config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = get_config_path().map_err(|e| ConfigError::Location(e.to_string()))?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// File contents only, defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;

        // Migration: the old single `api_key` field was the Gemini key
        if let Some(legacy_key) = config.api_key.take() {
            if config.gemini_api_key.is_none() {
                config.gemini_api_key = Some(legacy_key);
            }
            // Save migrated config
            if let Err(e) = config.save_to(path) {
                warn!("[load_config] Failed to save migrated config: {}", e);
            }
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("[save_config] Config saved to {}", path.display());
        Ok(())
    }

    /// Non-empty variables replace the corresponding file values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = var(GEMINI_API_KEY_ENV) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = var(OPENAI_TRANSCRIPTION_API_KEY_ENV) {
            self.openai_transcription_api_key = Some(key);
        }
        if let Some(name) = var(CLOUDINARY_CLOUD_NAME_ENV) {
            self.cloudinary.cloud_name = name;
        }
        if let Some(preset) = var(CLOUDINARY_UPLOAD_PRESET_ENV) {
            self.cloudinary.upload_preset = preset;
        }
    }

    /// The build-time key wins over anything configured.
    pub fn resolved_gemini_key(&self) -> Option<String> {
        get_builtin_api_key().or_else(|| {
            self.gemini_api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
        })
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_key: self.resolved_gemini_key(),
            model: self.chat_model.clone(),
            search_grounding: self.search_grounding,
        }
    }
}

// ============ Built-in API Key Support ============

/// XOR key for deobfuscation (must match build.rs)
const XOR_KEY: [u8; 16] = [
    0x4e, 0x65, 0x78, 0x6c, 0x79, 0x6e, 0x47, 0x72, 0x69, 0x64, 0x45, 0x78, 0x70, 0x65, 0x72,
    0x74,
];

/// Compile-time embedded obfuscated API key (hex-encoded)
const OBFUSCATED_API_KEY: &str = env!("OBFUSCATED_API_KEY");

/// Whether a built-in API key was provided at compile time
const HAS_BUILTIN_KEY: &str = env!("HAS_BUILTIN_KEY");

/// Deobfuscate the hex-encoded XOR-obfuscated API key
fn deobfuscate_api_key(hex_encoded: &str) -> Option<String> {
    if hex_encoded.is_empty() {
        return None;
    }

    let obfuscated: Vec<u8> = (0..hex_encoded.len())
        .step_by(2)
        .filter_map(|i| hex_encoded.get(i..i + 2))
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .collect();

    if obfuscated.is_empty() {
        return None;
    }

    let deobfuscated: Vec<u8> = obfuscated
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect();

    String::from_utf8(deobfuscated).ok()
}

pub fn get_builtin_api_key() -> Option<String> {
    if HAS_BUILTIN_KEY == "1" {
        deobfuscate_api_key(OBFUSCATED_API_KEY)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn obfuscate(key: &str) -> String {
        key.bytes()
            .enumerate()
            .map(|(i, b)| format!("{:02x}", b ^ XOR_KEY[i % XOR_KEY.len()]))
            .collect()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.chat_model, "gemini-3-flash-preview");
        assert!(config.search_grounding);
        assert_eq!(config.banner.interval_ms, 7000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"search_grounding": false, "passcodes": {"admin": "9999"}}"#)
            .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert!(!config.search_grounding);
        assert_eq!(config.passcodes.admin, "9999");
        assert_eq!(config.passcodes.owner, "4560");
        assert_eq!(config.banner, BannerTiming::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.gemini_api_key = Some("g-key".into());
        config.cloudinary.cloud_name = "nexlyn".into();
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn legacy_key_is_migrated_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "old-key"}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("old-key"));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"gemini_api_key\": \"old-key\""));
        assert!(!saved.contains("\"api_key\""));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (GEMINI_API_KEY_ENV, "env-key"),
            (CLOUDINARY_CLOUD_NAME_ENV, "env-cloud"),
            (CLOUDINARY_UPLOAD_PRESET_ENV, ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.gemini_api_key = Some("file-key".into());
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.gemini_api_key.as_deref(), Some("env-key"));
        assert_eq!(config.cloudinary.cloud_name, "env-cloud");
        assert_eq!(config.cloudinary.upload_preset, "unsigned_upload");
        assert_eq!(config.openai_transcription_api_key, None);
    }

    #[test]
    fn deobfuscation_reverses_build_script() {
        assert_eq!(
            deobfuscate_api_key(&obfuscate("AIzaSy-test-key-123")).as_deref(),
            Some("AIzaSy-test-key-123")
        );
        assert_eq!(deobfuscate_api_key(""), None);
        assert_eq!(deobfuscate_api_key("zz"), None);
    }

    #[test]
    fn settings_carry_model_and_grounding() {
        let mut config = AppConfig::default();
        config.search_grounding = false;
        config.gemini_api_key = Some("k".into());
        let settings = config.gemini_settings();
        assert_eq!(settings.model, "gemini-3-flash-preview");
        assert!(!settings.search_grounding);
        if get_builtin_api_key().is_none() {
            assert_eq!(settings.api_key.as_deref(), Some("k"));
        }
    }
}
