//! `/api/health/*` and the process-liveness `/api/health` (spec.md §6, and
//! SPEC_FULL.md's supplemental liveness endpoint).

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

#[derive(Serialize)]
pub struct BridgeHealthResponse {
    pub paused: bool,
}

pub async fn bridge_health(State(state): State<Arc<GatewayState>>) -> Json<BridgeHealthResponse> {
    Json(BridgeHealthResponse { paused: state.bridge_paused })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleHealthDto {
    pub url: String,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub relayer_fee_solana: String,
    pub relayer_fee_qubic: String,
}

#[derive(Serialize)]
pub struct OraclesHealthResponse {
    pub oracles: Vec<OracleHealthDto>,
}

pub async fn oracles_health(State(state): State<Arc<GatewayState>>) -> Json<OraclesHealthResponse> {
    let oracles = state
        .registry
        .list()
        .into_iter()
        .map(|h| OracleHealthDto {
            url: h.url,
            status: if h.is_healthy() { "ok" } else { "down" },
            timestamp: h.timestamp,
            relayer_fee_solana: h.relayer_fee_s.to_string(),
            relayer_fee_qubic: h.relayer_fee_q.to_string(),
        })
        .collect();
    Json(OraclesHealthResponse { oracles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::sample_state;
    use hub_types::{OracleHealth, OracleStatus};

    #[tokio::test]
    async fn liveness_reports_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn bridge_health_reflects_the_paused_flag() {
        let state = sample_state();
        let Json(body) = bridge_health(State(state)).await;
        assert!(!body.paused);
    }

    #[tokio::test]
    async fn oracles_health_reports_down_for_unreachable_oracles() {
        let state = sample_state();
        state.registry.update(
            "http://oracle-a",
            OracleHealth {
                url: "http://oracle-a".to_string(),
                status: OracleStatus::Down,
                timestamp: Utc::now(),
                relayer_fee_s: hub_types::Amount::zero(),
                relayer_fee_q: hub_types::Amount::zero(),
            },
        );
        let Json(body) = oracles_health(State(state)).await;
        assert_eq!(body.oracles.len(), 1);
        assert_eq!(body.oracles[0].status, "down");
    }
}
