//! Process-wide Prometheus metrics, registered once and read by every
//! component. Mirrors the teacher's `install_gateway_metrics` pattern:
//! `OnceCell`-backed statics initialized lazily on first access.

use once_cell::sync::Lazy;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    HistogramVec, IntCounterVec, IntGaugeVec,
};

pub static POLLER_ROUNDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bridge_hub_poller_rounds_total",
        "Total poller rounds run, by poller name and outcome",
        &["poller", "outcome"]
    )
    .expect("register poller_rounds_total")
});

pub static POLLER_ROUND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "bridge_hub_poller_round_duration_seconds",
        "Wall-clock duration of a poller round",
        &["poller"],
        exponential_buckets(0.01, 2.0, 12).expect("buckets")
    )
    .expect("register poller_round_duration")
});

pub static ORACLE_HEALTH: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "bridge_hub_oracle_health",
        "1 if the oracle is currently ok, 0 if down",
        &["url"]
    )
    .expect("register oracle_health")
});

pub static RECONCILE_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bridge_hub_reconcile_outcomes_total",
        "Reconciliation outcomes by kind",
        &["outcome"]
    )
    .expect("register reconcile_outcomes_total")
});

pub static EVENTS_INGESTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bridge_hub_events_ingested_total",
        "Events persisted by source and type",
        &["source", "event_type"]
    )
    .expect("register events_ingested_total")
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bridge_hub_http_requests_total",
        "Inbound HTTP requests by route and status",
        &["route", "status"]
    )
    .expect("register http_requests_total")
});

pub static WS_RECONNECTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bridge_hub_ws_reconnects_total",
        "Websocket listener reconnect attempts by endpoint role",
        &["endpoint"]
    )
    .expect("register ws_reconnects_total")
});

/// Forces all metric statics to register. Call once at startup so
/// `/metrics` is never empty even before the first poller round.
pub fn install() {
    Lazy::force(&POLLER_ROUNDS_TOTAL);
    Lazy::force(&POLLER_ROUND_DURATION);
    Lazy::force(&ORACLE_HEALTH);
    Lazy::force(&RECONCILE_OUTCOMES_TOTAL);
    Lazy::force(&EVENTS_INGESTED_TOTAL);
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&WS_RECONNECTS_TOTAL);
}

/// Renders the default registry in the Prometheus text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    encoder.encode(&metric_families, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
