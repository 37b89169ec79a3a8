#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Bridge fee estimation (C13) and the chain-S network cost estimator (C14).

pub mod cost_estimator;
mod error;
pub mod estimate;

pub use cost_estimator::{
    ConstantNetworkFeeEstimator, NetworkFeeEstimator, SolanaCostEstimator, BASE_FEE, OUTBOUND_CU, OUTBOUND_ORDER_RENT,
};
pub use error::FeeError;
pub use estimate::{EstimateInput, EstimateOutput, FeeConfig, FeeEstimator};
