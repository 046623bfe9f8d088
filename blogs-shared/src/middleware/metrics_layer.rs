use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const REQUESTS_TOTAL: &str = "blogs_http_requests_total";
const REQUEST_DURATION: &str = "blogs_http_request_duration_seconds";
const REQUESTS_IN_FLIGHT: &str = "blogs_http_requests_in_flight";

/// Records count, latency and in-flight requests per route template.
pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Unmatched paths share a single label.
    let route = matched_path
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    gauge!(REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(req).await;
    gauge!(REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status();
    let labels = [
        ("method", method),
        ("route", route),
        ("status", status.as_u16().to_string()),
    ];

    counter!(REQUESTS_TOTAL, &labels).increment(1);
    histogram!(REQUEST_DURATION, &labels).record(start.elapsed().as_secs_f64());

    response
}

/// Installs the global Prometheus recorder. Fails if one is already set.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(REQUESTS_TOTAL, Unit::Count, "HTTP requests served");
    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "HTTP request latency");

    Ok(handle)
}
