// Metrics collection and tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latency samples kept per endpoint for percentile calculation
const MAX_LATENCY_SAMPLES: usize = 1000;

/// Per-endpoint metrics
#[derive(Debug, Clone)]
pub struct EndpointMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub total_latency_ms: Arc<AtomicU64>,
    pub min_latency_ms: Arc<AtomicU64>,
    pub max_latency_ms: Arc<AtomicU64>,
    pub latency_samples: Arc<Mutex<VecDeque<u64>>>,
}

impl EndpointMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            total_latency_ms: Arc::new(AtomicU64::new(0)),
            min_latency_ms: Arc::new(AtomicU64::new(u64::MAX)),
            max_latency_ms: Arc::new(AtomicU64::new(0)),
            latency_samples: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LATENCY_SAMPLES))),
        }
    }

    /// Record one handled request and whether it failed.
    pub fn observe(&self, latency: Duration, ok: bool) {
        self.record_request(latency.as_millis() as u64);
        if !ok {
            self.record_error();
        }
    }

    pub fn record_request(&self, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            if samples.len() == MAX_LATENCY_SAMPLES {
                samples.pop_front();
            }
            samples.push_back(latency_ms);
        }
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.request_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    fn percentile(&self, p: u8) -> u64 {
        if let Ok(samples) = self.latency_samples.lock() {
            if samples.is_empty() {
                return 0;
            }
            let mut sorted: Vec<u64> = samples.iter().copied().collect();
            sorted.sort_unstable();
            let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
            sorted[index]
        } else {
            0
        }
    }

    pub fn snapshot(&self) -> EndpointStats {
        let min = self.min_latency_ms.load(Ordering::Relaxed);
        EndpointStats {
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: if min == u64::MAX { 0 } else { min },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            p50_latency_ms: self.percentile(50),
            p95_latency_ms: self.percentile(95),
            p99_latency_ms: self.percentile(99),
        }
    }
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming relay counters
#[derive(Debug, Clone, Default)]
pub struct RelayMetrics {
    pub streams_started: Arc<AtomicU64>,
    pub streams_completed: Arc<AtomicU64>,
    pub streams_cancelled: Arc<AtomicU64>,
    pub chunks_sent: Arc<AtomicU64>,
    pub bytes_relayed: Arc<AtomicU64>,
    pub artifacts_deleted: Arc<AtomicU64>,
    pub artifact_cleanup_failures: Arc<AtomicU64>,
}

impl RelayMetrics {
    pub fn record_stream_started(&self) {
        self.streams_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_completed(&self) {
        self.streams_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_cancelled(&self) {
        self.streams_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk(&self, len: usize) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_relayed.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn record_cleanup(&self, deleted: bool) {
        if deleted {
            self.artifacts_deleted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.artifact_cleanup_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            streams_started: self.streams_started.load(Ordering::Relaxed),
            streams_completed: self.streams_completed.load(Ordering::Relaxed),
            streams_cancelled: self.streams_cancelled.load(Ordering::Relaxed),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            bytes_relayed: self.bytes_relayed.load(Ordering::Relaxed),
            artifacts_deleted: self.artifacts_deleted.load(Ordering::Relaxed),
            artifact_cleanup_failures: self.artifact_cleanup_failures.load(Ordering::Relaxed),
        }
    }
}

/// Comprehensive metrics structure
#[derive(Debug, Clone)]
pub struct AppMetrics {
    pub tts: EndpointMetrics,
    pub tts_stream: EndpointMetrics,
    pub relay: RelayMetrics,
    started_at: Instant,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            tts: EndpointMetrics::new(),
            tts_stream: EndpointMetrics::new(),
            relay: RelayMetrics::default(),
            started_at: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> MetricsResponse {
        MetricsResponse {
            timestamp: Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            endpoints: EndpointMetricsResponse {
                tts: self.tts.snapshot(),
                tts_stream: self.tts_stream.snapshot(),
            },
            relay: self.relay.snapshot(),
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub endpoints: EndpointMetricsResponse,
    pub relay: RelayStats,
}

#[derive(Serialize)]
pub struct EndpointMetricsResponse {
    pub tts: EndpointStats,
    pub tts_stream: EndpointStats,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct EndpointStats {
    pub request_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct RelayStats {
    pub streams_started: u64,
    pub streams_completed: u64,
    pub streams_cancelled: u64,
    pub chunks_sent: u64,
    pub bytes_relayed: u64,
    pub artifacts_deleted: u64,
    pub artifact_cleanup_failures: u64,
}
