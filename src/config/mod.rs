//! Configuration management
//!
//! Every setting resolves env > TOML file > default. The language-model
//! credential is mandatory; its absence is a fatal startup error.

pub mod file;

use secrecy::SecretString;

use crate::generator::GEMINI_API_BASE;
use crate::persona::{DEFAULT_MODEL, Persona};
use crate::voice::OPENAI_API_BASE;
use crate::{Error, Language, Result};

pub use file::ConfigFile;

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language-model settings
    pub llm: LlmConfig,

    /// Speech settings
    pub voice: VoiceConfig,

    /// Assistant persona
    pub persona: Persona,

    /// Initial speech locale
    pub language: Language,
}

/// Language-model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini API key (`API_KEY`)
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,
}

/// Speech configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Use microphone and speaker
    pub enabled: bool,

    /// `OpenAI` API key for STT and TTS
    pub api_key: Option<SecretString>,

    /// Speech API base URL
    pub base_url: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or a value is invalid
    pub fn load(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or a value is invalid
    pub fn from_sources(
        fc: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        disable_voice: bool,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Language-model credential (env > toml); required
        let api_key = env("API_KEY")
            .or_else(|| env("GEMINI_API_KEY"))
            .or(fc.api_keys.gemini.filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| Error::Config("API_KEY environment variable not set".to_string()))?;

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            model: env("REVOLT_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env("REVOLT_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
        };

        let tts_speed = match env("REVOLT_TTS_SPEED") {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|e| Error::Config(format!("invalid REVOLT_TTS_SPEED {raw:?}: {e}")))?,
            None => fc.voice.tts_speed.unwrap_or(1.0),
        };

        let voice = VoiceConfig {
            enabled: !disable_voice && fc.voice.enabled.unwrap_or(true),
            api_key: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            base_url: env("OPENAI_BASE_URL")
                .or(fc.voice.base_url)
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            stt_model: env("REVOLT_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("REVOLT_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: env("REVOLT_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: tts_speed.clamp(0.25, 4.0),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled");
        }

        let language = env("REVOLT_LANGUAGE")
            .or(fc.language)
            .map(|tag| tag.parse::<Language>())
            .transpose()
            .map_err(|e| Error::Config(e.to_string()))?
            .unwrap_or_default();

        let persona = Persona::default().with_overrides(
            env("REVOLT_SYSTEM_INSTRUCTION").or(fc.persona.system_instruction),
            fc.persona.greeting,
        );

        Ok(Self {
            llm,
            voice,
            persona,
            language,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_sources(ConfigFile::default(), env_of(&[]), false).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("API_KEY")));
    }

    #[test]
    fn test_blank_api_key_is_fatal() {
        let result = Config::from_sources(ConfigFile::default(), env_of(&[("API_KEY", "  ")]), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_sources(ConfigFile::default(), env_of(&[("API_KEY", "k")]), false)
                .unwrap();
        assert_eq!(config.llm.api_key.expose_secret(), "k");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, GEMINI_API_BASE);
        assert!(config.voice.enabled);
        assert!(config.voice.api_key.is_none());
        assert_eq!(config.voice.stt_model, "whisper-1");
        assert_eq!(config.voice.tts_model, "tts-1");
        assert_eq!(config.voice.tts_voice, "alloy");
        assert!((config.voice.tts_speed - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.language, Language::EnUs);
        assert_eq!(config.persona, Persona::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut fc = ConfigFile::default();
        fc.api_keys.gemini = Some("file-key".to_string());
        fc.llm.model = Some("file-model".to_string());
        fc.language = Some("de-DE".to_string());

        let config = Config::from_sources(
            fc,
            env_of(&[("GEMINI_API_KEY", "env-key"), ("REVOLT_LANGUAGE", "ja-JP")]),
            false,
        )
        .unwrap();
        assert_eq!(config.llm.api_key.expose_secret(), "env-key");
        assert_eq!(config.llm.model, "file-model");
        assert_eq!(config.language, Language::JaJp);
    }

    #[test]
    fn test_key_from_file() {
        let mut fc = ConfigFile::default();
        fc.api_keys.gemini = Some("file-key".to_string());
        let config = Config::from_sources(fc, env_of(&[]), false).unwrap();
        assert_eq!(config.llm.api_key.expose_secret(), "file-key");
    }

    #[test]
    fn test_invalid_language_rejected() {
        let result = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("API_KEY", "k"), ("REVOLT_LANGUAGE", "xx-YY")]),
            false,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_tts_speed_clamped_and_validated() {
        let config = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("API_KEY", "k"), ("REVOLT_TTS_SPEED", "9")]),
            false,
        )
        .unwrap();
        assert!((config.voice.tts_speed - 4.0).abs() < f64::EPSILON);

        let result = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("API_KEY", "k"), ("REVOLT_TTS_SPEED", "fast")]),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_disable_voice_wins() {
        let config =
            Config::from_sources(ConfigFile::default(), env_of(&[("API_KEY", "k")]), true)
                .unwrap();
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_persona_overrides_from_file() {
        let mut fc = ConfigFile::default();
        fc.persona.greeting = Some("Welcome back!".to_string());
        let config = Config::from_sources(fc, env_of(&[("API_KEY", "k")]), false).unwrap();
        assert_eq!(config.persona.greeting, "Welcome back!");
    }
}
