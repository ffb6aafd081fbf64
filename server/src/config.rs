// Configuration for the relay server

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tts_core::{AudioFormat, SpeechOptions, DEFAULT_BASE_URL, DEFAULT_CHUNK_SIZE};

/// Minimum headroom of the request timeout over the provider timeout.
pub const PROVIDER_TIMEOUT_MARGIN_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub tts_format: AudioFormat,
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
    pub cleanup_delay_ms: u64,
    pub artifact_dir: PathBuf,
    pub provider_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub rate_limit_per_minute: u32,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_format: AudioFormat::Mp3,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: 10,
            cleanup_delay_ms: 5000,
            artifact_dir: std::env::temp_dir(),
            provider_timeout_secs: 60,
            request_timeout_secs: 60,
            rate_limit_per_minute: 60,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Self {
            port: parse_or(lookup("PORT"), defaults.port),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: text("OPENAI_BASE_URL", defaults.openai_base_url),
            tts_model: text("TTS_MODEL", defaults.tts_model),
            tts_voice: text("TTS_VOICE", defaults.tts_voice),
            tts_format: parse_or(lookup("TTS_FORMAT"), defaults.tts_format),
            chunk_size: parse_or(lookup("TTS_CHUNK_SIZE"), defaults.chunk_size).max(1),
            chunk_delay_ms: parse_or(lookup("TTS_CHUNK_DELAY_MS"), defaults.chunk_delay_ms),
            cleanup_delay_ms: parse_or(lookup("TTS_CLEANUP_DELAY_MS"), defaults.cleanup_delay_ms),
            artifact_dir: lookup("TTS_ARTIFACT_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            provider_timeout_secs: parse_or(
                lookup("PROVIDER_TIMEOUT_SECS"),
                defaults.provider_timeout_secs,
            ),
            request_timeout_secs: parse_or(
                lookup("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            ),
            rate_limit_per_minute: parse_or(
                lookup("RATE_LIMIT_PER_MINUTE"),
                defaults.rate_limit_per_minute,
            )
            .max(1),
            cors_allowed_origins,
        }
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }

    /// Never shorter than the provider timeout plus a margin.
    pub fn request_timeout(&self) -> Duration {
        let floor = self
            .provider_timeout_secs
            .saturating_add(PROVIDER_TIMEOUT_MARGIN_SECS);
        Duration::from_secs(self.request_timeout_secs.max(floor))
    }

    pub fn speech_options(&self) -> SpeechOptions {
        SpeechOptions {
            model: self.tts_model.clone(),
            voice: self.tts_voice.clone(),
            format: self.tts_format,
            timeout: Duration::from_secs(self.provider_timeout_secs),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.chunk_size, 2048);
        assert_eq!(config.chunk_delay(), Duration::from_millis(10));
        assert_eq!(config.cleanup_delay(), Duration::from_secs(5));
        assert!(config.openai_api_key.is_none());
        assert!(config.cors_allowed_origins.is_none());
        assert_eq!(config.speech_options().format, AudioFormat::Mp3);
    }

    #[test]
    fn test_request_timeout_outlasts_provider_timeout() {
        let config = config_from(&[]);
        assert_eq!(config.request_timeout(), Duration::from_secs(65));

        let config = config_from(&[
            ("PROVIDER_TIMEOUT_SECS", "30"),
            ("REQUEST_TIMEOUT_SECS", "10"),
        ]);
        assert_eq!(config.request_timeout(), Duration::from_secs(35));
        assert_eq!(config.speech_options().timeout, Duration::from_secs(30));

        let config = config_from(&[("REQUEST_TIMEOUT_SECS", "120")]);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_tts_format_from_environment() {
        assert_eq!(
            config_from(&[("TTS_FORMAT", "opus")]).speech_options().format,
            AudioFormat::Opus
        );
        assert_eq!(
            config_from(&[("TTS_FORMAT", "WAV")]).tts_format,
            AudioFormat::Wav
        );
        assert_eq!(
            config_from(&[("TTS_FORMAT", "ogg")]).tts_format,
            AudioFormat::Mp3
        );
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "sk-abc"),
            ("TTS_VOICE", "nova"),
            ("TTS_CHUNK_DELAY_MS", "0"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.speech_options().voice, "nova");
        assert!(config.chunk_delay().is_zero());
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("TTS_CHUNK_SIZE", "0"),
            ("RATE_LIMIT_PER_MINUTE", "0"),
            ("OPENAI_API_KEY", "   "),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.rate_limit_per_minute, 1);
        assert!(config.openai_api_key.is_none());
    }
}
