//! Shared state handed to every handler via axum's `State` extractor.

use std::sync::Arc;

use hub_crypto::HubKeys;
use hub_fee::FeeEstimator;
use hub_oracle::OracleRegistry;
use hub_repo::{EventsRepository, OrdersRepository};

pub struct GatewayState {
    pub orders: Arc<dyn OrdersRepository>,
    pub events: Arc<dyn EventsRepository>,
    pub registry: Arc<OracleRegistry>,
    pub fee_estimator: Arc<FeeEstimator>,
    pub keys: Arc<HubKeys>,
    /// `ORACLE_SIGNATURE_THRESHOLD` / `ORACLE_COUNT`, needed to compute the
    /// required signature count for `GET /api/orders/signatures`.
    pub signature_threshold: f64,
    pub oracle_count: usize,
    /// Whether relaying is currently paused (`GET /api/health/bridge`).
    /// Advisory only — the hub never relays transactions itself (spec.md §1
    /// Non-goals), so this reflects an externally-set operational flag.
    pub bridge_paused: bool,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ed25519_dalek::pkcs8::EncodePublicKey;
    use ed25519_dalek::SigningKey;
    use hub_crypto::KeyMaterial;
    use hub_fee::{ConstantNetworkFeeEstimator, FeeConfig, FeeEstimator};
    use hub_repo::{InMemoryEventsRepository, InMemoryOrdersRepository};
    use hub_types::Amount;
    use rand::rngs::OsRng;

    fn sample_key_material(kid: &str) -> KeyMaterial {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_pem = signing_key
            .verifying_key()
            .to_public_key_pem(Default::default())
            .expect("encode public key");
        KeyMaterial {
            kid: kid.to_string(),
            verifying_key: signing_key.verifying_key(),
            signing_key: Some(Arc::new(signing_key)),
            public_key_pem,
        }
    }

    /// A `GatewayState` wired entirely to in-memory backends: empty
    /// repositories, no configured oracles, a one-off hub identity, and a
    /// zero-constant network fee on both legs. Handlers exercised against
    /// this fixture need `registry.update(...)` calls to simulate healthy
    /// oracles before anything fee-related will succeed.
    pub(crate) fn sample_state() -> Arc<GatewayState> {
        let registry = Arc::new(OracleRegistry::new(&[]));
        let fee_estimator = Arc::new(FeeEstimator::new(
            FeeConfig::default(),
            registry.clone(),
            Arc::new(ConstantNetworkFeeEstimator(Amount::zero())),
            Arc::new(ConstantNetworkFeeEstimator(Amount::zero())),
        ));
        let keys = Arc::new(HubKeys::load_with(
            "hub-test".to_string(),
            sample_key_material("k1"),
            None,
        ));
        Arc::new(GatewayState {
            orders: Arc::new(InMemoryOrdersRepository::new()),
            events: Arc::new(InMemoryEventsRepository::new()),
            registry,
            fee_estimator,
            keys,
            signature_threshold: 0.67,
            oracle_count: 3,
            bridge_paused: false,
        })
    }
}
