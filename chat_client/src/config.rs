// Configuration for the chat client

use std::str::FromStr;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o-2024-08-06";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the speech relay.
    pub backend_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub agent_model: String,
    pub agent_temperature: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            agent_model: DEFAULT_AGENT_MODEL.to_string(),
            agent_temperature: 0.2,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            backend_url: text("BACKEND_URL", defaults.backend_url),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: text("OPENAI_BASE_URL", defaults.openai_base_url),
            agent_model: text("AGENT_MODEL", defaults.agent_model),
            agent_temperature: parse_or(lookup("AGENT_TEMPERATURE"), defaults.agent_temperature),
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

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.backend_url, "http://localhost:3000");
        assert_eq!(config.agent_model, "gpt-4o-2024-08-06");
        assert!(config.openai_api_key.is_none());
        assert!((config.agent_temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = ClientConfig::from_lookup(|key| match key {
            "BACKEND_URL" => Some("http://10.0.2.2:3000/".into()),
            "OPENAI_API_KEY" => Some("sk-live".into()),
            "AGENT_TEMPERATURE" => Some("0.7".into()),
            _ => None,
        });
        assert_eq!(config.backend_url, "http://10.0.2.2:3000");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-live"));
        assert!((config.agent_temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blank_key_and_bad_numbers_fall_back() {
        let config = ClientConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("   ".into()),
            "AGENT_TEMPERATURE" => Some("warm".into()),
            _ => None,
        });
        assert!(config.openai_api_key.is_none());
        assert!((config.agent_temperature - 0.2).abs() < f32::EPSILON);
    }
}
