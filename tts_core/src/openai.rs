//! OpenAI speech endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{AudioFormat, SpeechProvider, TtsError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Voice and model selection for a speech client.
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    pub model: String,
    pub voice: String,
    pub format: AudioFormat,
    pub timeout: Duration,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            model: "tts-1".into(),
            voice: "alloy".into(),
            format: AudioFormat::Mp3,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Body of `POST /audio/speech`
#[derive(Serialize)]
struct SpeechRequestBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: AudioFormat,
}

pub struct OpenAiSpeechClient {
    api_key: String,
    client: Client,
    base_url: String,
    options: SpeechOptions,
}

impl OpenAiSpeechClient {
    pub fn new(api_key: impl Into<String>, options: SpeechOptions) -> Result<Self, TtsError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TtsError::MissingApiKey);
        }
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            options,
        })
    }

    /// Point the client at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Bytes, TtsError> {
        let url = format!("{}/audio/speech", self.base_url);
        let body = SpeechRequestBody {
            model: &self.options.model,
            voice: &self.options.voice,
            input: text,
            response_format: self.options.format,
        };

        debug!(model = %self.options.model, voice = %self.options.voice, chars = text.chars().count(), "Requesting speech");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "TTS provider rejected request");
            return Err(TtsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        debug!(bytes = audio.len(), "Speech received");
        Ok(audio)
    }

    fn format(&self) -> AudioFormat {
        self.options.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::net::SocketAddr;

    async fn spawn_provider(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_synthesize_sends_expected_request() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "tts-1");
                assert_eq!(body["voice"], "alloy");
                assert_eq!(body["input"], "hello there");
                assert_eq!(body["response_format"], "mp3");
                vec![1u8, 2, 3, 4]
            }),
        );
        let addr = spawn_provider(router).await;

        let client = OpenAiSpeechClient::new("sk-test", SpeechOptions::default())
            .unwrap()
            .with_base_url(format!("http://{addr}/v1/"));
        let audio = client.synthesize("hello there").await.unwrap();
        assert_eq!(audio.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let addr = spawn_provider(router).await;

        let client = OpenAiSpeechClient::new("sk-bad", SpeechOptions::default())
            .unwrap()
            .with_base_url(format!("http://{addr}/v1"));
        match client.synthesize("hello").await {
            Err(TtsError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_audio_is_an_error() {
        let router = Router::new().route("/v1/audio/speech", post(|| async { Vec::<u8>::new() }));
        let addr = spawn_provider(router).await;

        let client = OpenAiSpeechClient::new("sk-test", SpeechOptions::default())
            .unwrap()
            .with_base_url(format!("http://{addr}/v1"));
        assert!(matches!(
            client.synthesize("hello").await,
            Err(TtsError::EmptyAudio)
        ));
    }

    #[tokio::test]
    async fn test_configured_format_is_requested() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["response_format"], "opus");
                vec![9u8; 16]
            }),
        );
        let addr = spawn_provider(router).await;

        let options = SpeechOptions {
            format: AudioFormat::Opus,
            ..SpeechOptions::default()
        };
        let client = OpenAiSpeechClient::new("sk-test", options)
            .unwrap()
            .with_base_url(format!("http://{addr}/v1"));
        assert_eq!(client.format(), AudioFormat::Opus);
        assert_eq!(client.synthesize("hello").await.unwrap().len(), 16);
    }

    #[test]
    fn test_blank_api_key_rejected() {
        assert!(matches!(
            OpenAiSpeechClient::new("  ", SpeechOptions::default()),
            Err(TtsError::MissingApiKey)
        ));
    }
}
