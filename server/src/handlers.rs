use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::artifact::TransientArtifact;
use crate::error::ApiError;
use crate::metrics::MetricsResponse;
use crate::relay::{relay_stream, RelaySettings};
use crate::validation::{preview, validate_tts_request};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

/// `POST /tts`: the whole utterance in one response.
pub async fn tts_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = speak_buffered(&state, payload).await;
    state.metrics.tts.observe(started.elapsed(), result.is_ok());
    result
}

/// `POST /tts/stream`: the utterance as paced, fixed-size chunks.
pub async fn tts_stream_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = speak_streamed(&state, payload).await;
    state
        .metrics
        .tts_stream
        .observe(started.elapsed(), result.is_ok());
    result
}

fn request_text(payload: Result<Json<TtsRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Rejected TTS payload: {}", rejection.body_text());
        ApiError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let text = validate_tts_request(req.text.as_deref()).inspect_err(|_| {
        warn!("Missing text parameter");
    })?;
    Ok(text.to_owned())
}

async fn speak_buffered(
    state: &AppState,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let text = request_text(payload)?;
    info!(chars = text.chars().count(), "Processing TTS for text: \"{}\"", preview(&text));

    let audio = state.provider.synthesize(&text).await?;
    let content_type = state.provider.format().content_type();
    info!(bytes = audio.len(), "Audio sent to client");

    Ok(([(header::CONTENT_TYPE, content_type)], audio).into_response())
}

async fn speak_streamed(
    state: &AppState,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let text = request_text(payload)?;
    info!(chars = text.chars().count(), "Processing streaming TTS for text: \"{}\"", preview(&text));

    // The provider call completes before anything is written anywhere.
    let audio = state.provider.synthesize(&text).await?;
    let format = state.provider.format();

    let artifact = TransientArtifact::create(&state.config.artifact_dir, format.extension())
        .await
        .map_err(|e| ApiError::InternalError(format!("Could not create audio artifact: {e}")))?;
    info!(
        bytes = audio.len(),
        artifact = %artifact.path().display(),
        "TTS response received, streaming to client"
    );

    let body = Body::from_stream(relay_stream(
        audio,
        artifact,
        RelaySettings::from_config(&state.config),
        state.shutdown.child_token(),
        state.metrics.relay.clone(),
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|e| ApiError::InternalError(format!("Could not build response: {e}")))
}
