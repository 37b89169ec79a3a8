//! Router assembly and the server loop (spec.md §6), grounded on the
//! teacher's `http-rpc-gateway::run_server` layer stack. CORS is dropped —
//! this surface is operator-facing, not public (spec.md §1 "out of scope")
//! — but per-IP rate limiting (`RATE_LIMIT_MAX`, spec.md §6/§7) and the
//! rest of the ambient stack (timeouts, load shedding, panic isolation,
//! tracing) are kept.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tokio::sync::watch;
use tower::limit::ConcurrencyLimitLayer;
use tower::load_shed::LoadShedLayer;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::not_found;
use crate::rate_limit::{rate_limit_middleware, IpLimiter};
use crate::routes::{estimate, health, keys, orders};
use crate::state::GatewayState;

pub struct GatewayConfig {
    pub listen_addr: String,
    pub body_limit_kb: usize,
    pub rate_limit_max: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            body_limit_kb: 64,
            rate_limit_max: 100,
        }
    }
}

async fn metrics_handler() -> impl IntoResponse {
    match hub_telemetry::metrics::render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(error) => {
            tracing::error!(%error, "failed to encode prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encode failed").into_response()
        }
    }
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "message": "request timed out" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "message": err.to_string() })),
        )
    }
}

fn build_router(state: Arc<GatewayState>, limiter: IpLimiter) -> Router {
    Router::new()
        .route("/api/health", get(health::liveness))
        .route("/api/health/bridge", get(health::bridge_health))
        .route("/api/health/oracles", get(health::oracles_health))
        .route("/api/keys", get(keys::keys))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/signatures", get(orders::signatures))
        .route("/api/orders/events", get(orders::events))
        .route("/api/orders/trx-hash", get(orders::by_trx_hash))
        .route("/api/orders/estimate", post(estimate::estimate))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(128))
                .layer(TimeoutLayer::new(Duration::from_secs(2))),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(
    config: GatewayConfig,
    state: Arc<GatewayState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    hub_telemetry::metrics::install();

    let limiter = IpLimiter::new(config.rate_limit_max);
    let app =
        build_router(state, limiter).layer(RequestBodyLimitLayer::new(config.body_limit_kb * 1024));

    let addr: SocketAddr = config.listen_addr.parse()?;
    tracing::info!(target: "hub-gateway", %addr, "bridge hub HTTP surface listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_rx.changed().await.ok();
        tracing::info!(target: "hub-gateway", "shutting down gracefully");
    })
    .await?;
    Ok(())
}
