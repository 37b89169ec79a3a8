//! Oracle signatures accumulated per order.

use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderSignature {
    pub order_id: Uuid,
    pub signature: String,
}

/// Result of `OrdersRepository::add_signatures`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AddSignaturesOutcome {
    pub added: u64,
    pub total: u64,
}
