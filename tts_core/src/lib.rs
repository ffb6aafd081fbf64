//! Speech synthesis plumbing shared by the relay server.
//!
//! * [`SpeechProvider`] is the seam between the relay and whatever turns
//!   text into audio. The production implementation is
//!   [`OpenAiSpeechClient`].
//! * [`AudioChunks`] slices a finished audio buffer into the fixed-size
//!   chunks the streaming endpoint emits.

mod error;
mod openai;
mod stream;

use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use error::TtsError;
pub use openai::{OpenAiSpeechClient, SpeechOptions, DEFAULT_BASE_URL};
pub use stream::{chunk_count, AudioChunks, DEFAULT_CHUNK_SIZE};

/// Encoded audio formats a provider can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Pcm => "audio/pcm",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Opus => "opus",
            AudioFormat::Aac => "aac",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
            AudioFormat::Pcm => "pcm",
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    /// Case-insensitive, using the provider's `response_format` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "opus" => Ok(AudioFormat::Opus),
            "aac" => Ok(AudioFormat::Aac),
            "flac" => Ok(AudioFormat::Flac),
            "wav" => Ok(AudioFormat::Wav),
            "pcm" => Ok(AudioFormat::Pcm),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

/// Something that turns text into a complete, encoded audio buffer.
///
/// Providers are called once per request and return the whole utterance;
/// incremental delivery is the caller's business.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Bytes, TtsError>;

    /// Encoding of the buffers returned by [`SpeechProvider::synthesize`].
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }
}
