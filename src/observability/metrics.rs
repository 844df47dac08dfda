//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lookup_queries_total` (counter): queries answered, by `outcome`
//! - `lookup_query_duration_seconds` (histogram): read-to-response latency
//! - `lookup_active_connections` (gauge): current connection count
//! - `lookup_dataset_reload_failures_total` (counter): failed reread loads
//! - `lookup_tls_handshake_failures_total` (counter)
//! - `lookup_accept_backoffs_total` (counter): accepts deferred for lack of descriptors or memory

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::server::response::Response;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_query(response: Response, start: Instant) {
    counter!("lookup_queries_total", "outcome" => response.label()).increment(1);
    histogram!("lookup_query_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn set_active_connections(active: u64) {
    gauge!("lookup_active_connections").set(active as f64);
}

pub fn record_reload_failure() {
    counter!("lookup_dataset_reload_failures_total").increment(1);
}

pub fn record_tls_handshake_failure() {
    counter!("lookup_tls_handshake_failures_total").increment(1);
}

pub fn record_accept_backoff() {
    counter!("lookup_accept_backoffs_total").increment(1);
}
