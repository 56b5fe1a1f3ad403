//! Metrics collection and exposition.
//!
//! # Metrics
//! - `grole_requests_total` (counter): requests by method, status
//! - `grole_request_duration_seconds` (histogram): time from parsed request
//!   to fully written response
//! - `grole_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until a recorder is installed, so the library can
//! be used without the Prometheus exporter.
//!
//! The `method` label takes one of a fixed set of values; unknown methods
//! are recorded as `OTHER`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one served request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method_label(method);
    metrics::counter!(
        "grole_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("grole_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Collapse a client-supplied method token onto a bounded label set.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

pub fn connection_opened() {
    metrics::gauge!("grole_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("grole_active_connections").decrement(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_keep_their_label() {
        for method in ["GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
            assert_eq!(method_label(method), method);
        }
        assert_eq!(method_label("get"), "OTHER");
        assert_eq!(method_label("BREW"), "OTHER");
    }

    #[test]
    fn arbitrary_methods_share_one_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            for i in 0..200 {
                record_request(&format!("X{i}"), 404, Instant::now());
            }
            record_request("GET", 404, Instant::now());
        });

        let rendered = handle.render();
        let series: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("grole_requests_total{"))
            .collect();
        assert_eq!(series.len(), 2, "{rendered}");
        assert!(series
            .iter()
            .any(|line| line.contains("method=\"OTHER\"") && line.ends_with(" 200")));
    }
}
