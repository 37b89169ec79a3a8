//! The cross-cutting error kinds from spec §7.
//!
//! Individual crates define their own narrower error enums at their seams
//! (a `RepoError` in `hub-repo`, a `DecodeError` in `hub-chain-sol`, ...);
//! this enum is what those narrower errors fold into at the boundaries the
//! error-handling table in spec §7 actually cares about — the places a
//! caller has to make a policy decision (swallow, retry, surface as HTTP).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("http status {code}")]
    HttpStatus { code: u16 },

    #[error("schema mismatch: payload_type={payload_type}, keys={payload_keys:?}")]
    SchemaMismatch {
        payload_type: &'static str,
        payload_keys: Vec<String>,
    },

    #[error("reconcile mismatch for order {order_id}: field {field}")]
    ReconcileMismatch { order_id: String, field: &'static str },

    #[error("no consensus for order {order_id}")]
    NoConsensus { order_id: String },

    #[error("order {order_id} missing from repository")]
    RepositoryMissing { order_id: String },

    #[error("duplicate event")]
    DuplicateEvent,

    #[error("estimate unavailable: {0}")]
    EstimateUnavailable(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("shutdown")]
    ShutdownCancellation,
}

impl HubError {
    /// Whether this error kind represents a normal, expected exit path
    /// rather than something worth logging at `warn`/`error` (spec §7).
    pub fn is_benign_shutdown(&self) -> bool {
        matches!(self, HubError::ShutdownCancellation)
    }
}
