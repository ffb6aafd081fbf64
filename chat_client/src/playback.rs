//! Local audio playback.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Could not decode audio: {0}")]
    Decode(String),

    #[error("Could not open audio output: {0}")]
    Output(String),

    #[error("Playback task failed: {0}")]
    Task(String),
}

/// Plays one complete audio buffer, returning once playback has finished.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: Bytes) -> Result<(), PlaybackError>;
}

/// Plays on the default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, audio: Bytes) -> Result<(), PlaybackError> {
        tokio::task::spawn_blocking(move || {
            // Decode before touching the device so malformed audio fails fast.
            let source = Decoder::new(Cursor::new(audio.to_vec()))
                .map_err(|e| PlaybackError::Decode(e.to_string()))?;

            // rodio 0.21: the OutputStream is the handle and must outlive the sink
            let stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| PlaybackError::Output(e.to_string()))?;
            let sink = Sink::connect_new(stream.mixer());
            sink.append(source);
            debug!("Playing audio");
            sink.sleep_until_end();
            Ok(())
        })
        .await
        .map_err(|e| PlaybackError::Task(e.to_string()))?
    }
}
