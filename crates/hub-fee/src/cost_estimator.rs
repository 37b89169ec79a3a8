//! Chain-S Cost Estimator (C14, spec §4.14).

use std::sync::Arc;

use async_trait::async_trait;
use hub_net::JsonClient;
use hub_types::Amount;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::FeeError;

pub const BASE_FEE: u64 = 5_000;
pub const OUTBOUND_ORDER_RENT: u64 = 2_185_440;
pub const OUTBOUND_CU: u64 = 30_000;

/// Supplies the `networkFee` leg of a fee estimate for one destination
/// chain. Chain S goes through the real RPC below; chain Q is mocked to
/// a constant (spec §4.13 step 4) until a chain-Q cost estimator exists.
#[async_trait]
pub trait NetworkFeeEstimator: Send + Sync {
    async fn estimate_user_network_fee(&self) -> Result<Amount, FeeError>;
}

pub struct ConstantNetworkFeeEstimator(pub Amount);

#[async_trait]
impl NetworkFeeEstimator for ConstantNetworkFeeEstimator {
    async fn estimate_user_network_fee(&self) -> Result<Amount, FeeError> {
        Ok(self.0.clone())
    }
}

pub struct SolanaCostEstimator {
    client: Arc<JsonClient>,
    rpc_url: String,
    account_keys: Vec<String>,
}

impl SolanaCostEstimator {
    pub fn new(client: Arc<JsonClient>, rpc_url: String, account_keys: Vec<String>) -> Self {
        Self { client, rpc_url, account_keys }
    }
}

#[derive(Serialize)]
struct PriorityFeeRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: [PriorityFeeParams<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityFeeParams<'a> {
    account_keys: &'a [String],
    options: PriorityFeeOptions,
}

#[derive(Serialize)]
struct PriorityFeeOptions {
    recommended: bool,
}

#[derive(Deserialize)]
struct PriorityFeeResponse {
    result: PriorityFeeResult,
}

#[derive(Deserialize)]
struct PriorityFeeResult {
    #[serde(rename = "priorityFeeEstimate")]
    priority_fee_estimate: f64,
}

#[async_trait]
impl NetworkFeeEstimator for SolanaCostEstimator {
    async fn estimate_user_network_fee(&self) -> Result<Amount, FeeError> {
        let request = PriorityFeeRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "getPriorityFeeEstimate",
            params: [PriorityFeeParams {
                account_keys: &self.account_keys,
                options: PriorityFeeOptions { recommended: true },
            }],
        };

        let cancel = CancellationToken::new();
        let response: PriorityFeeResponse = self
            .client
            .post_json(&self.rpc_url, "", &request, &cancel, &[])
            .await?;

        let priority = priority_fee_lamports(response.result.priority_fee_estimate);
        Ok(Amount::from_u64(BASE_FEE + priority + OUTBOUND_ORDER_RENT))
    }
}

fn priority_fee_lamports(micro_units_per_compute_unit: f64) -> u64 {
    let scaled = micro_units_per_compute_unit * OUTBOUND_CU as f64 / 1_000_000.0;
    scaled.ceil().max(0.0) as u64
}
