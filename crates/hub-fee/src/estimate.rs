//! Fee Estimator (C13, spec §4.13).

use std::sync::Arc;

use hub_oracle::OracleRegistry;
use hub_types::{Amount, ChainId, OracleStatus};
use num_bigint::BigUint;

use crate::cost_estimator::NetworkFeeEstimator;
use crate::error::FeeError;

pub struct FeeConfig {
    pub bps_fee: u32,
    pub protocol_fee_bps_of_bps: u32,
    pub min_healthy_oracles: usize,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            bps_fee: 100,
            protocol_fee_bps_of_bps: 1_000,
            min_healthy_oracles: 4,
        }
    }
}

pub struct EstimateInput {
    pub network_in: ChainId,
    pub network_out: ChainId,
    pub amount: Amount,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EstimateOutput {
    pub bridge_fee_oracle: Amount,
    pub bridge_fee_protocol: Amount,
    pub bridge_fee_total: Amount,
    pub relayer_fee: Amount,
    pub network_fee: Amount,
    pub user_receives: Amount,
}

pub struct FeeEstimator {
    config: FeeConfig,
    registry: Arc<OracleRegistry>,
    chain_s_network_fee: Arc<dyn NetworkFeeEstimator>,
    chain_q_network_fee: Arc<dyn NetworkFeeEstimator>,
}

impl FeeEstimator {
    pub fn new(
        config: FeeConfig,
        registry: Arc<OracleRegistry>,
        chain_s_network_fee: Arc<dyn NetworkFeeEstimator>,
        chain_q_network_fee: Arc<dyn NetworkFeeEstimator>,
    ) -> Self {
        Self { config, registry, chain_s_network_fee, chain_q_network_fee }
    }

    pub async fn estimate(&self, input: EstimateInput) -> Result<EstimateOutput, FeeError> {
        if input.network_in == input.network_out {
            return Err(FeeError::SameNetwork);
        }

        let bridge_fee_oracle = bps_floor(&input.amount, self.config.bps_fee);
        let bridge_fee_protocol = bps_floor(&bridge_fee_oracle, self.config.protocol_fee_bps_of_bps);
        let bridge_fee_total = bridge_fee_oracle.checked_add(&bridge_fee_protocol);

        let healthy: Vec<_> = self
            .registry
            .list()
            .into_iter()
            .filter(|h| h.status == OracleStatus::Ok)
            .collect();
        if healthy.len() < self.config.min_healthy_oracles {
            return Err(FeeError::EstimateUnavailable);
        }

        // Keyed by the *source* network (spec.md scenario S4: a transfer
        // whose destination is chain S — and whose network fee is
        // therefore the chain-S C14 estimate — draws its relayer-fee quote
        // from each oracle's `relayerFeeQ`, i.e. the *other* chain's quote).
        let relayer_fees: Vec<Amount> = healthy
            .into_iter()
            .map(|h| match input.network_in {
                ChainId::ChainS => h.relayer_fee_s,
                ChainId::ChainQ => h.relayer_fee_q,
            })
            .collect();
        let relayer_fee = median(relayer_fees);

        let network_fee = match input.network_out {
            ChainId::ChainS => self.chain_s_network_fee.estimate_user_network_fee().await?,
            ChainId::ChainQ => self.chain_q_network_fee.estimate_user_network_fee().await?,
        };

        let after_bridge = input.amount.checked_sub(&bridge_fee_total).ok_or(FeeError::AmountTooSmall)?;
        let user_receives = after_bridge.checked_sub(&relayer_fee).ok_or(FeeError::AmountTooSmall)?;

        Ok(EstimateOutput {
            bridge_fee_oracle,
            bridge_fee_protocol,
            bridge_fee_total,
            relayer_fee,
            network_fee,
            user_receives,
        })
    }
}

fn bps_floor(amount: &Amount, bps: u32) -> Amount {
    let numerator = amount.as_biguint() * BigUint::from(bps);
    Amount::from(numerator / BigUint::from(10_000u32))
}

/// `median` of an even-sized set floors `(mid1 + mid2) / 2` via integer
/// division (spec §4.13).
fn median(mut values: Vec<Amount>) -> Amount {
    assert!(!values.is_empty(), "median requires at least one value");
    values.sort();
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2].clone()
    } else {
        let mid1 = values[n / 2 - 1].as_biguint().clone();
        let mid2 = values[n / 2].as_biguint().clone();
        Amount::from((mid1 + mid2) / BigUint::from(2u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_estimator::ConstantNetworkFeeEstimator;
    use async_trait::async_trait;
    use hub_types::OracleHealth;

    #[test]
    fn bps_floor_truncates_toward_zero() {
        assert_eq!(bps_floor(&Amount::from_u64(999), 100), Amount::from_u64(9));
        assert_eq!(bps_floor(&Amount::from_u64(1_000), 100), Amount::from_u64(10));
    }

    #[test]
    fn median_of_odd_count_is_the_middle_value() {
        let values = vec![Amount::from_u64(1), Amount::from_u64(5), Amount::from_u64(3)];
        assert_eq!(median(values), Amount::from_u64(3));
    }

    #[test]
    fn median_of_even_count_floors_the_average_of_the_middle_two() {
        let values = vec![Amount::from_u64(1), Amount::from_u64(2), Amount::from_u64(4), Amount::from_u64(7)];
        assert_eq!(median(values), Amount::from_u64(3));
    }

    struct FailingNetworkFee;

    #[async_trait]
    impl NetworkFeeEstimator for FailingNetworkFee {
        async fn estimate_user_network_fee(&self) -> Result<Amount, FeeError> {
            unreachable!("the leg for the other destination chain should not be called")
        }
    }

    fn healthy_registry(count: usize) -> Arc<OracleRegistry> {
        let urls: Vec<String> = (0..count).map(|i| format!("http://oracle-{i}")).collect();
        let registry = OracleRegistry::new(&urls);
        for url in &urls {
            registry.update(
                url,
                OracleHealth {
                    url: url.clone(),
                    status: OracleStatus::Ok,
                    timestamp: chrono::Utc::now(),
                    relayer_fee_s: Amount::from_u64(10),
                    relayer_fee_q: Amount::from_u64(20),
                },
            );
        }
        Arc::new(registry)
    }

    /// Registry with four healthy oracles quoting `relayerFeeQ` of 2, 4, 6,
    /// 8 — the quorum from the worked bridge-fee example.
    fn registry_with_relayer_fees_q(fees: &[u64]) -> Arc<OracleRegistry> {
        let urls: Vec<String> = (0..fees.len()).map(|i| format!("http://oracle-{i}")).collect();
        let registry = OracleRegistry::new(&urls);
        for (url, fee) in urls.iter().zip(fees) {
            registry.update(
                url,
                OracleHealth {
                    url: url.clone(),
                    status: OracleStatus::Ok,
                    timestamp: chrono::Utc::now(),
                    relayer_fee_s: Amount::zero(),
                    relayer_fee_q: Amount::from_u64(*fee),
                },
            );
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn rejects_same_network_transfers() {
        let estimator = FeeEstimator::new(
            FeeConfig::default(),
            healthy_registry(4),
            Arc::new(ConstantNetworkFeeEstimator(Amount::zero())),
            Arc::new(FailingNetworkFee),
        );
        let result = estimator
            .estimate(EstimateInput {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainS,
                amount: Amount::from_u64(1_000),
            })
            .await;
        assert!(matches!(result, Err(FeeError::SameNetwork)));
    }

    #[tokio::test]
    async fn fails_with_estimate_unavailable_below_min_healthy_oracles() {
        let estimator = FeeEstimator::new(
            FeeConfig::default(),
            healthy_registry(2),
            Arc::new(ConstantNetworkFeeEstimator(Amount::zero())),
            Arc::new(ConstantNetworkFeeEstimator(Amount::zero())),
        );
        let result = estimator
            .estimate(EstimateInput {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainQ,
                amount: Amount::from_u64(1_000),
            })
            .await;
        assert!(matches!(result, Err(FeeError::EstimateUnavailable)));
    }

    #[tokio::test]
    async fn computes_full_estimate_with_healthy_quorum() {
        let estimator = FeeEstimator::new(
            FeeConfig::default(),
            healthy_registry(4),
            Arc::new(FailingNetworkFee),
            Arc::new(ConstantNetworkFeeEstimator(Amount::from_u64(5))),
        );
        let output = estimator
            .estimate(EstimateInput {
                network_in: ChainId::ChainS,
                network_out: ChainId::ChainQ,
                amount: Amount::from_u64(10_000),
            })
            .await
            .unwrap();

        assert_eq!(output.bridge_fee_oracle, Amount::from_u64(100));
        assert_eq!(output.bridge_fee_protocol, Amount::from_u64(10));
        assert_eq!(output.bridge_fee_total, Amount::from_u64(110));
        assert_eq!(output.relayer_fee, Amount::from_u64(10));
        assert_eq!(output.network_fee, Amount::from_u64(5));
        assert_eq!(output.user_receives, Amount::from_u64(10_000 - 110 - 10));
    }

    /// Worked example straight from the bridge-fee design notes: a
    /// Q-to-S transfer of 1,000,000 with healthy oracles quoting
    /// `relayerFeeQ` of 2/4/6/8 and a chain-S network fee of 2,190,440
    /// (spec.md scenario S4 — `networkFee` pins the chain-S C14 formula,
    /// which only applies when `networkOut == chainS`).
    #[tokio::test]
    async fn matches_the_worked_bridge_fee_example() {
        let estimator = FeeEstimator::new(
            FeeConfig::default(),
            registry_with_relayer_fees_q(&[2, 4, 6, 8]),
            Arc::new(ConstantNetworkFeeEstimator(Amount::from_u64(2_190_440))),
            Arc::new(FailingNetworkFee),
        );
        let output = estimator
            .estimate(EstimateInput {
                network_in: ChainId::ChainQ,
                network_out: ChainId::ChainS,
                amount: Amount::from_u64(1_000_000),
            })
            .await
            .unwrap();

        assert_eq!(output.bridge_fee_oracle, Amount::from_u64(10_000));
        assert_eq!(output.bridge_fee_protocol, Amount::from_u64(1_000));
        assert_eq!(output.bridge_fee_total, Amount::from_u64(11_000));
        assert_eq!(output.relayer_fee, Amount::from_u64(5));
        assert_eq!(output.network_fee, Amount::from_u64(2_190_440));
        assert_eq!(output.user_receives, Amount::from_u64(988_995));
    }
}
