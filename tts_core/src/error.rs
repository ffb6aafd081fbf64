use thiserror::Error;

/// Errors raised while requesting speech from a provider.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("request to TTS provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TTS provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("TTS provider returned no audio")]
    EmptyAudio,
}
