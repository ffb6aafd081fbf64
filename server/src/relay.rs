//! Chunked relay of a synthesized utterance.
//!
//! The provider has already returned the complete buffer. The relay slices
//! it with [`AudioChunks`], mirrors every chunk into the request's
//! [`TransientArtifact`] and then hands it to the response body. The
//! artifact write is awaited before the chunk is yielded, and the next
//! chunk is only produced when hyper polls for it, so both sinks advance
//! together.
//!
//! Each stream carries a [`CancellationToken`]. Dropping the response body
//! (client disconnect) or cancelling the parent token (server shutdown)
//! stops the loop and removes the artifact right away. A stream cut short
//! by shutdown ends with an `Interrupted` error item. A stream that runs
//! to completion leaves its artifact on disk for `cleanup_delay`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tts_core::AudioChunks;

use crate::artifact::{remove_artifact, TransientArtifact};
use crate::config::ServerConfig;
use crate::metrics::RelayMetrics;

#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    pub chunk_size: usize,
    /// Pause between chunks; zero streams as fast as the client reads.
    pub chunk_delay: Duration,
    pub cleanup_delay: Duration,
}

impl RelaySettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_delay: config.chunk_delay(),
            cleanup_delay: config.cleanup_delay(),
        }
    }
}

/// Build the response body stream for one request.
///
/// Spawns the artifact cleanup task immediately, so the artifact is
/// removed even if the returned stream is never polled.
pub fn relay_stream(
    audio: Bytes,
    mut artifact: TransientArtifact,
    settings: RelaySettings,
    token: CancellationToken,
    metrics: RelayMetrics,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let (done_tx, done_rx) = oneshot::channel::<()>();
    tokio::spawn(cleanup_after(
        artifact.path().to_path_buf(),
        token.clone(),
        done_rx,
        settings.cleanup_delay,
        metrics.clone(),
    ));
    metrics.record_stream_started();
    let request_id = artifact.id();

    async_stream::stream! {
        // Cancels the token if the body is dropped before we disarm it.
        let guard = token.clone().drop_guard();
        let total_bytes = audio.len();
        let chunks = AudioChunks::new(audio, settings.chunk_size);
        let expected = chunks.len();
        let mut sent = 0usize;

        for (index, chunk) in chunks.enumerate() {
            if index > 0 && !settings.chunk_delay.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(settings.chunk_delay) => {}
                }
            }
            if token.is_cancelled() {
                break;
            }
            artifact.write_chunk(&chunk).await;
            metrics.record_chunk(chunk.len());
            sent += 1;
            yield Ok::<Bytes, io::Error>(chunk);
        }

        artifact.finish().await;

        if sent == expected {
            guard.disarm();
            metrics.record_stream_completed();
            info!(%request_id, chunks = sent, bytes = total_bytes, "Audio streaming completed successfully");
            let _ = done_tx.send(());
        } else {
            info!(%request_id, chunks = sent, expected, "Audio stream stopped early");
            // Abort the response rather than end a truncated body cleanly.
            yield Err(io::Error::new(
                io::ErrorKind::Interrupted,
                format!("audio stream cancelled after {sent} of {expected} chunks"),
            ));
        }
    }
}

/// Wait for the stream to finish or be abandoned, then delete the artifact.
async fn cleanup_after(
    path: PathBuf,
    token: CancellationToken,
    done: oneshot::Receiver<()>,
    delay: Duration,
    metrics: RelayMetrics,
) {
    let completed = tokio::select! {
        biased;
        result = done => result.is_ok(),
        _ = token.cancelled() => false,
    };

    if completed {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = token.cancelled() => debug!(path = %path.display(), "Shutting down, removing artifact early"),
        }
    } else {
        metrics.record_stream_cancelled();
        info!(path = %path.display(), "Stream abandoned, removing artifact now");
    }

    let deleted = remove_artifact(&path).await;
    metrics.record_cleanup(deleted);
}
