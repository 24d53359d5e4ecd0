//! Prometheus metrics for pokemon-service.
//!
//! HTTP traffic plus latency and failures of the two collaborators (the
//! collection store and the generative text provider).

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

/// Registry and collectors, created together so they never disagree.
struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    collaborator_request_duration_seconds: HistogramVec,
    collaborator_errors_total: IntCounterVec,
    // type: input, output
    genai_tokens_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "route", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["method", "route"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let collaborator_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "collaborator_request_duration_seconds",
                "Latency of calls to the store and the text provider in seconds",
            )
            .buckets(vec![0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["collaborator", "operation"],
        )
        .expect("Failed to create collaborator_request_duration_seconds metric");

        let collaborator_errors_total = IntCounterVec::new(
            Opts::new(
                "collaborator_errors_total",
                "Total failed calls to the store and the text provider",
            ),
            &["collaborator", "operation"],
        )
        .expect("Failed to create collaborator_errors_total metric");

        let genai_tokens_total = IntCounterVec::new(
            Opts::new("genai_tokens_total", "Total tokens processed"),
            &["model", "type"],
        )
        .expect("Failed to create genai_tokens_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds");
        registry
            .register(Box::new(collaborator_request_duration_seconds.clone()))
            .expect("Failed to register collaborator_request_duration_seconds");
        registry
            .register(Box::new(collaborator_errors_total.clone()))
            .expect("Failed to register collaborator_errors_total");
        registry
            .register(Box::new(genai_tokens_total.clone()))
            .expect("Failed to register genai_tokens_total");

        tracing::info!("Prometheus metrics initialized");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            collaborator_request_duration_seconds,
            collaborator_errors_total,
            genai_tokens_total,
        }
    }
}

/// Initialize all metrics. Concurrent and repeated calls share one registry.
pub fn init_metrics() {
    METRICS.get_or_init(Metrics::new);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let metrics = match METRICS.get() {
        Some(m) => m,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = metrics.registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    if let Some(metrics) = METRICS.get() {
        let status = status.to_string();
        metrics
            .http_requests_total
            .with_label_values(&[method, route, status.as_str()])
            .inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration_secs);
    }
}

/// Record the latency of one collaborator call.
pub fn record_collaborator_call(collaborator: &str, operation: &str, duration_secs: f64) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .collaborator_request_duration_seconds
            .with_label_values(&[collaborator, operation])
            .observe(duration_secs);
    }
}

/// Record a failed collaborator call.
pub fn record_collaborator_error(collaborator: &str, operation: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .collaborator_errors_total
            .with_label_values(&[collaborator, operation])
            .inc();
    }
}

/// Record token usage per model.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(metrics) = METRICS.get() {
        let counter = &metrics.genai_tokens_total;
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Counts and times every request, labelled by its route template so that
/// path parameters do not explode label cardinality.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
