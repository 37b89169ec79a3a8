//! Errors from the reconciliator (C7).

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("reconcile mismatch for order {order_id}: field {field}")]
    Mismatch { order_id: Uuid, field: &'static str },

    #[error("no consensus for order {order_id}")]
    NoConsensus { order_id: Uuid },
}
