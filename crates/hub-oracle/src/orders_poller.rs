//! Oracle Orders Poller (C9, spec §4.9).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hub_crypto::RequestSigner;
use hub_net::JsonClient;
use hub_repo::OrdersRepository;
use hub_scheduler::PollerTask;
use hub_telemetry::metrics::RECONCILE_OUTCOMES_TOTAL;
use hub_types::{NewOrder, OrderPatch, OrderSignature};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::reconcile::reconcile;
use crate::registry::OracleRegistry;
use crate::wire::{OrderWithSignature, OrdersPayload};

pub struct OrdersPoller {
    client: Arc<JsonClient>,
    signer: Arc<RequestSigner>,
    registry: Arc<OracleRegistry>,
    orders: Arc<dyn OrdersRepository>,
    interval: Duration,
    /// `ORACLE_SIGNATURE_THRESHOLD`: a ratio in `(0,1]` or a raw integer count.
    threshold: f64,
    oracle_count: usize,
}

impl OrdersPoller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<JsonClient>,
        signer: Arc<RequestSigner>,
        registry: Arc<OracleRegistry>,
        orders: Arc<dyn OrdersRepository>,
        interval: Duration,
        threshold: f64,
        oracle_count: usize,
    ) -> Self {
        Self {
            client,
            signer,
            registry,
            orders,
            interval,
            threshold,
            oracle_count,
        }
    }
}

/// `required = ceil(oracleCount * threshold)` when `threshold` is a ratio
/// in `(0,1]`, else `floor(threshold)`; never below 1 (spec §4.9 step 4).
pub fn compute_required_signatures(threshold: f64, oracle_count: usize) -> u64 {
    let required = if threshold > 0.0 && threshold <= 1.0 {
        (oracle_count as f64 * threshold).ceil()
    } else {
        threshold.floor()
    };
    (required as u64).max(1)
}

#[async_trait]
impl PollerTask<String, Vec<OrderWithSignature>> for OrdersPoller {
    async fn fetch_one(
        &self,
        server: &String,
        cancel: CancellationToken,
    ) -> Option<Vec<OrderWithSignature>> {
        let healthy = self.registry.get(server).map(|h| h.is_healthy()).unwrap_or(false);
        if !healthy {
            return None;
        }

        let url = format!("{server}/api/orders");
        let headers = match self.signer.sign_get("GET", &url) {
            Ok(headers) => headers,
            Err(error) => {
                tracing::warn!(%server, %error, "could not sign oracle orders request");
                return Some(Vec::new());
            }
        };
        let pairs = headers.as_pairs();

        match self
            .client
            .get_json::<OrdersPayload>(server, "/api/orders", &cancel, &pairs)
            .await
        {
            Ok(payload) => Some(payload.into_orders()),
            Err(error) => {
                tracing::warn!(
                    %server,
                    %error,
                    payload_type = "unknown",
                    "oracle orders payload did not match the expected schema"
                );
                Some(Vec::new())
            }
        }
    }

    async fn on_round(&self, successes: Vec<Vec<OrderWithSignature>>) {
        let mut groups: HashMap<Uuid, Vec<OrderWithSignature>> = HashMap::new();
        for reports in successes {
            for report in reports {
                groups.entry(report.id).or_default().push(report);
            }
        }

        let required = compute_required_signatures(self.threshold, self.oracle_count);

        for (order_id, group) in groups {
            let consensus = match reconcile(order_id, &group) {
                Ok(consensus) => consensus,
                Err(error) => {
                    RECONCILE_OUTCOMES_TOTAL
                        .with_label_values(&["mismatch"])
                        .inc();
                    tracing::warn!(%order_id, %error, "skipping order: reconciliation failed");
                    continue;
                }
            };
            RECONCILE_OUTCOMES_TOTAL.with_label_values(&["consensus"]).inc();

            if let Err(error) = self.ensure_order_exists(order_id, &consensus).await {
                tracing::warn!(%order_id, %error, "could not create order from consensus");
                continue;
            }

            let signatures: Vec<OrderSignature> = group
                .iter()
                .map(|report| OrderSignature {
                    order_id,
                    signature: report.signature.clone(),
                })
                .collect();
            let outcome = match self.orders.add_signatures(order_id, signatures).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(%order_id, %error, "failed recording signatures");
                    continue;
                }
            };

            let meets_threshold = outcome.total >= required;
            let can_be_relayable = !consensus.status.is_terminal_for_relay();
            let new_status = if meets_threshold && can_be_relayable {
                hub_types::OrderStatus::ReadyForRelay
            } else {
                consensus.status
            };

            let patch = OrderPatch {
                status: Some(new_status),
                destination_trx_hash: consensus.destination_trx_hash.clone(),
                ..Default::default()
            };
            match self.orders.update(order_id, patch).await {
                Ok(Some(_)) => {}
                Ok(None) => tracing::warn!(%order_id, "skipped missing order"),
                Err(error) => tracing::warn!(%order_id, %error, "failed updating order"),
            }
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

impl OrdersPoller {
    async fn ensure_order_exists(
        &self,
        order_id: Uuid,
        consensus: &OrderWithSignature,
    ) -> Result<(), hub_repo::RepoError> {
        if self.orders.find_by_id(order_id).await?.is_some() {
            return Ok(());
        }
        self.orders
            .create(NewOrder {
                id: order_id,
                source: consensus.source,
                dest: consensus.dest,
                from: consensus.from.clone(),
                to: consensus.to.clone(),
                amount: consensus.amount.clone(),
                relayer_fee: consensus.relayer_fee.clone(),
                origin_trx_hash: consensus.origin_trx_hash.clone(),
                destination_trx_hash: consensus.destination_trx_hash.clone(),
                source_nonce: None,
                source_payload: None,
                oracle_accept_to_relay: consensus.oracle_accept_to_relay,
                status: consensus.status,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_signatures_uses_ratio_when_in_zero_one_range() {
        assert_eq!(compute_required_signatures(0.5, 5), 3);
        assert_eq!(compute_required_signatures(1.0, 5), 5);
    }

    #[test]
    fn required_signatures_uses_raw_count_outside_ratio_range() {
        assert_eq!(compute_required_signatures(3.0, 10), 3);
    }

    #[test]
    fn required_signatures_is_never_below_one() {
        assert_eq!(compute_required_signatures(0.01, 1), 1);
        assert_eq!(compute_required_signatures(0.0, 0), 1);
    }
}
