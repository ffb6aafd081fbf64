pub mod artifact;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod relay;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tts_core::SpeechProvider;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::metrics::AppMetrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn SpeechProvider>,
    pub config: ServerConfig,
    pub metrics: AppMetrics,
    /// Parent of every streaming request's cancellation token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(provider: Arc<dyn SpeechProvider>, config: ServerConfig) -> Self {
        Self {
            provider,
            config,
            metrics: AppMetrics::new(),
            shutdown: CancellationToken::new(),
        }
    }
}

/// All routes, mounted at the root and again under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        .route("/tts", post(handlers::tts_endpoint))
        .route("/tts/stream", post(handlers::tts_stream_endpoint))
        .route("/metrics", get(handlers::metrics_endpoint));

    // The timeout covers the time to response headers, not the streamed body.
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors_layer(&state.config))
        .into_inner();

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}

/// Allow-all unless `CORS_ALLOWED_ORIGINS` names specific origins.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let Some(allowed_origins) = config.cors_allowed_origins.as_ref() else {
        return base.allow_origin(Any);
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
        base.allow_origin(Any)
    } else {
        info!("CORS configured for {} origin(s)", origins.len());
        base.allow_origin(AllowOrigin::list(origins))
    }
}

/// Tag every request and response with an id, reusing the caller's if sent.
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id = request
        .headers()
        .get(&header)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

    let Some(request_id) = request_id else {
        return next.run(request).await;
    };
    request.headers_mut().insert(header.clone(), request_id.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(header, request_id);
    response
}
