//! TOML configuration file loading
//!
//! Supports `~/.config/revolt/voice.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Default speech locale (e.g. "en-GB")
    #[serde(default)]
    pub language: Option<String>,

    /// Language-model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Persona overrides
    #[serde(default)]
    pub persona: PersonaFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Language-model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,
}

/// Speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone and speaker
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Speech API base URL
    pub base_url: Option<String>,
}

/// Persona overrides
#[derive(Debug, Default, Deserialize)]
pub struct PersonaFileConfig {
    /// Replacement system instruction
    pub system_instruction: Option<String>,

    /// Replacement greeting
    pub greeting: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Gemini API key (same as `API_KEY`)
    pub gemini: Option<String>,

    /// `OpenAI` API key for speech recognition and synthesis
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    config_file_path().map_or_else(ConfigFile::default, |path| load_config_file_from(&path))
}

/// Load the TOML config file at `path`
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Read and parse the TOML config file at `path`
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file can't be read and
/// [`crate::Error::Toml`] if
/// it isn't valid TOML for [`ConfigFile`]
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path
///
/// `REVOLT_VOICE_CONFIG` overrides the default `~/.config/revolt/voice.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("REVOLT_VOICE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|d| d.config_dir().join("revolt").join("voice.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("absent.toml"));
        assert!(fc.language.is_none());
        assert!(fc.api_keys.gemini.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.toml");
        std::fs::write(
            &path,
            r#"
language = "fr-FR"

[llm]
model = "gemini-2.0-flash"

[voice]
tts_voice = "nova"
tts_speed = 1.25

[api_keys]
gemini = "file-key"
"#,
        )
        .unwrap();

        let fc = load_config_file_from(&path);
        assert_eq!(fc.language.as_deref(), Some("fr-FR"));
        assert_eq!(fc.llm.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(fc.llm.base_url.is_none());
        assert_eq!(fc.voice.tts_voice.as_deref(), Some("nova"));
        assert_eq!(fc.voice.tts_speed, Some(1.25));
        assert_eq!(fc.api_keys.gemini.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.toml");
        std::fs::write(&path, "language = [not toml").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.language.is_none());
    }

    #[test]
    fn test_read_errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.toml");
        std::fs::write(&path, "[voice]\ntts_speed = \"fast\"").unwrap();

        assert!(matches!(read_config_file(&path), Err(Error::Toml(_))));
        assert!(matches!(
            read_config_file(&dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }
}
