//! Common utilities for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tts_core::{AudioFormat, SpeechProvider, TtsError};
use tts_relay::{build_router, config::ServerConfig, AppState};

/// Provider double that counts calls and returns canned audio or a failure.
pub struct StubProvider {
    audio: Bytes,
    fail: bool,
    delay: Duration,
    format: AudioFormat,
    calls: AtomicUsize,
}

impl StubProvider {
    fn build(audio: Bytes, fail: bool, delay: Duration, format: AudioFormat) -> Arc<Self> {
        Arc::new(Self {
            audio,
            fail,
            delay,
            format,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(audio: Bytes) -> Arc<Self> {
        Self::build(audio, false, Duration::ZERO, AudioFormat::Mp3)
    }

    pub fn returning_format(audio: Bytes, format: AudioFormat) -> Arc<Self> {
        Self::build(audio, false, Duration::ZERO, format)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(Bytes::new(), true, Duration::ZERO, AudioFormat::Mp3)
    }

    /// Fails only after `delay`, like an upstream that times out.
    pub fn failing_after(delay: Duration) -> Arc<Self> {
        Self::build(Bytes::new(), true, delay, AudioFormat::Mp3)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for StubProvider {
    async fn synthesize(&self, _text: &str) -> Result<Bytes, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(TtsError::Api {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(self.audio.clone())
    }

    fn format(&self) -> AudioFormat {
        self.format
    }
}

/// Deterministic fake audio of `len` bytes.
pub fn sample_audio(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i * 7 % 256) as u8).collect::<Vec<u8>>())
}

/// Fresh, not yet existing directory for one test's artifacts.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("tts-relay-test-{}", uuid::Uuid::new_v4()))
}

pub fn artifact_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

/// Config tuned for tests: no pacing, artifacts in `artifact_dir`.
pub fn test_config(artifact_dir: &Path) -> ServerConfig {
    ServerConfig {
        chunk_delay_ms: 0,
        artifact_dir: artifact_dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

/// Create a test app instance
pub fn create_test_app(provider: Arc<StubProvider>, config: ServerConfig) -> Router {
    build_router(AppState::new(provider, config))
}

/// Test app plus the token that signals server shutdown to its streams.
pub fn create_test_app_with_shutdown(
    provider: Arc<StubProvider>,
    config: ServerConfig,
) -> (Router, CancellationToken) {
    let state = AppState::new(provider, config);
    let shutdown = state.shutdown.clone();
    (build_router(state), shutdown)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
