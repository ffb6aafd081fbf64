//! Speech requests against the relay.
//!
//! Short replies go to the buffered `/tts` endpoint, long ones to the
//! chunked `/tts/stream` endpoint. Either way the whole utterance is
//! collected before it is handed to the [`AudioPlayer`].

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{header, Client};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::playback::{AudioPlayer, PlaybackError};

/// Texts with at least this many characters use the streaming endpoint.
pub const STREAMING_THRESHOLD_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechRoute {
    Buffered,
    Streamed,
}

impl SpeechRoute {
    pub fn for_text(text: &str) -> Self {
        if text.chars().count() >= STREAMING_THRESHOLD_CHARS {
            SpeechRoute::Streamed
        } else {
            SpeechRoute::Buffered
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            SpeechRoute::Buffered => "/tts",
            SpeechRoute::Streamed => "/tts/stream",
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Relay returned no audio")]
    EmptyAudio,

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

pub struct SpeechDispatcher {
    client: Client,
    backend_url: String,
    player: Arc<dyn AudioPlayer>,
}

impl SpeechDispatcher {
    pub fn new(backend_url: impl Into<String>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            client: Client::new(),
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            player,
        }
    }

    /// Request speech for `text` and return the complete audio buffer.
    pub async fn fetch_audio(&self, text: &str) -> Result<Bytes, SpeechError> {
        let route = SpeechRoute::for_text(text);
        let url = format!("{}{}", self.backend_url, route.path());
        debug!(?route, chars = text.chars().count(), "Requesting speech");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "audio/mpeg")
            .json(&SpeechRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = match route {
            SpeechRoute::Buffered => response.bytes().await?,
            SpeechRoute::Streamed => {
                let mut buffer = BytesMut::new();
                let mut chunks = response.bytes_stream();
                while let Some(chunk) = chunks.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                buffer.freeze()
            }
        };

        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        debug!(bytes = audio.len(), "Speech received");
        Ok(audio)
    }

    /// Speak `text` aloud. Failures are logged and never returned.
    pub async fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if let Err(e) = self.try_speak(text).await {
            warn!("Could not speak reply: {e}");
        }
    }

    async fn try_speak(&self, text: &str) -> Result<(), SpeechError> {
        let audio = self.fetch_audio(text).await?;
        self.player.play(audio).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_counts_characters() {
        assert_eq!(SpeechRoute::for_text(&"a".repeat(99)), SpeechRoute::Buffered);
        assert_eq!(SpeechRoute::for_text(&"a".repeat(100)), SpeechRoute::Streamed);
        // 99 chars, 198 bytes
        assert_eq!(SpeechRoute::for_text(&"é".repeat(99)), SpeechRoute::Buffered);
        assert_eq!(SpeechRoute::for_text(""), SpeechRoute::Buffered);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(SpeechRoute::Buffered.path(), "/tts");
        assert_eq!(SpeechRoute::Streamed.path(), "/tts/stream");
    }
}
