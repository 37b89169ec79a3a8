//! The `Order` aggregate and its status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::chain::ChainId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    ReadyForRelay,
    Relayed,
    Failed,
    Finalized,
}

impl OrderStatus {
    /// Terminal statuses may never move back to `ready-for-relay` (spec §3 invariants).
    pub fn is_terminal_for_relay(&self) -> bool {
        matches!(self, OrderStatus::Finalized | OrderStatus::Relayed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub source: ChainId,
    pub dest: ChainId,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub relayer_fee: Amount,
    pub origin_trx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_trx_hash: Option<String>,
    pub source_nonce: String,
    pub source_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason_public: Option<String>,
    pub oracle_accept_to_relay: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `OrdersRepository::create`. `source_nonce`/`source_payload`
/// are derived by the repository when omitted (spec §4.4).
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub id: Uuid,
    pub source: ChainId,
    pub dest: ChainId,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub relayer_fee: Amount,
    pub origin_trx_hash: String,
    pub destination_trx_hash: Option<String>,
    pub source_nonce: Option<String>,
    pub source_payload: Option<String>,
    pub oracle_accept_to_relay: bool,
    pub status: OrderStatus,
}

/// Fields an oracle (or the reconciliator) may legally update on an existing order.
#[derive(Clone, Debug, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub destination_trx_hash: Option<String>,
    pub oracle_accept_to_relay: Option<bool>,
    pub failure_reason_public: Option<String>,
}

/// `source != dest` is a hard invariant on every order (spec §3).
#[derive(Debug, thiserror::Error)]
#[error("order source and dest chain must differ")]
pub struct SameChainError;

pub fn validate_distinct_chains(source: ChainId, dest: ChainId) -> Result<(), SameChainError> {
    if source == dest {
        Err(SameChainError)
    } else {
        Ok(())
    }
}

/// Pagination / filter parameters for `OrdersRepository::paginate`.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub page: u32,
    pub limit: u32,
    pub order_desc: bool,
    pub source: Option<ChainId>,
    pub dest: Option<ChainId>,
    pub status: Option<Vec<OrderStatus>>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount_min: Option<Amount>,
    pub amount_max: Option<Amount>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub id: Option<Uuid>,
}

#[derive(Clone, Debug)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_same_chain_orders() {
        assert!(validate_distinct_chains(ChainId::ChainS, ChainId::ChainS).is_err());
        assert!(validate_distinct_chains(ChainId::ChainS, ChainId::ChainQ).is_ok());
    }

    #[test]
    fn finalized_and_relayed_are_terminal_for_relay() {
        assert!(OrderStatus::Finalized.is_terminal_for_relay());
        assert!(OrderStatus::Relayed.is_terminal_for_relay());
        assert!(!OrderStatus::Pending.is_terminal_for_relay());
    }
}
