//! `POST /api/orders/estimate` (spec.md §6, §4.13).

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use hub_fee::EstimateInput;
use hub_types::{Amount, ChainId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::GatewayState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub network_in: ChainId,
    pub network_out: ChainId,
    /// Accepted but unused by the estimate itself — kept to mirror the
    /// wire request shape spec.md §6 defines for this endpoint.
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    pub amount: Amount,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeeDto {
    pub oracle_fee: String,
    pub protocol_fee: String,
    pub total: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateDto {
    pub bridge_fee: BridgeFeeDto,
    pub relayer_fee: String,
    pub network_fee: String,
    pub user_receives: String,
}

#[derive(Serialize)]
pub struct EstimateResponse {
    pub data: FeeEstimateDto,
}

pub async fn estimate(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let output = state
        .fee_estimator
        .estimate(EstimateInput {
            network_in: req.network_in,
            network_out: req.network_out,
            amount: req.amount,
        })
        .await?;

    Ok(Json(EstimateResponse {
        data: FeeEstimateDto {
            bridge_fee: BridgeFeeDto {
                oracle_fee: output.bridge_fee_oracle.to_string(),
                protocol_fee: output.bridge_fee_protocol.to_string(),
                total: output.bridge_fee_total.to_string(),
            },
            relayer_fee: output.relayer_fee.to_string(),
            network_fee: output.network_fee.to_string(),
            user_receives: output.user_receives.to_string(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::sample_state;
    use axum::response::IntoResponse;
    use hub_types::OracleHealth;
    use hub_types::OracleStatus;

    fn with_healthy_oracles(state: &Arc<GatewayState>, count: usize) {
        for i in 0..count {
            let url = format!("http://oracle-{i}");
            state.registry.update(
                &url,
                OracleHealth {
                    url: url.clone(),
                    status: OracleStatus::Ok,
                    timestamp: chrono::Utc::now(),
                    relayer_fee_s: Amount::from_u64(10),
                    relayer_fee_q: Amount::from_u64(20),
                },
            );
        }
    }

    #[tokio::test]
    async fn estimate_returns_camel_case_nested_bridge_fee() {
        let state = sample_state();
        with_healthy_oracles(&state, 4);

        let Json(body) = estimate(
            State(state),
            Json(EstimateRequest {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainQ,
                from_address: None,
                to_address: None,
                amount: Amount::from_u64(10_000),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.data.bridge_fee.oracle_fee, "100");
        assert_eq!(body.data.bridge_fee.protocol_fee, "10");
        assert_eq!(body.data.bridge_fee.total, "110");
        assert_eq!(body.data.relayer_fee, "10");
        assert_eq!(body.data.network_fee, "0");
    }

    #[tokio::test]
    async fn same_network_transfer_is_a_bad_request() {
        let state = sample_state();
        with_healthy_oracles(&state, 4);

        let err = estimate(
            State(state),
            Json(EstimateRequest {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainS,
                from_address: None,
                to_address: None,
                amount: Amount::from_u64(10_000),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn below_minimum_healthy_oracles_is_service_unavailable() {
        let state = sample_state();
        with_healthy_oracles(&state, 1);

        let err = estimate(
            State(state),
            Json(EstimateRequest {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainQ,
                from_address: None,
                to_address: None,
                amount: Amount::from_u64(10_000),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
