use axum::{extract::Request, middleware::Next, response::Response};
use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static TRANSCRIPTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Idempotent; later calls leave the first registry in place.
pub fn init_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let request_duration = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let transcriptions_total = IntCounterVec::new(
        Opts::new(
            "transcriptions_total",
            "Transcription attempts by outcome",
        ),
        &["outcome"],
    )
    .expect("metric can be created");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(transcriptions_total.clone()))
        .expect("collector can be registered");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = TRANSCRIPTIONS_TOTAL.set(transcriptions_total);
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let registry = REGISTRY.get().expect("metrics registry not initialized");
    let metric_families = registry.gather();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Count a transcription attempt: `success`, `timeout`, or
/// `upstream_error`.
pub fn record_transcription(outcome: &str) {
    if let Some(counter) = TRANSCRIPTIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Per-request counter and latency histogram.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    if let (Some(requests), Some(duration)) = (
        HTTP_REQUESTS_TOTAL.get(),
        HTTP_REQUEST_DURATION_SECONDS.get(),
    ) {
        requests.with_label_values(&[&method, &path, &status]).inc();
        duration
            .with_label_values(&[&method, &path, &status])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
