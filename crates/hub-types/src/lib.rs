#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Core data structures and error types shared across the bridge hub.

pub mod amount;
pub mod chain;
pub mod error;
pub mod event;
pub mod keys;
pub mod oracle;
pub mod order;
pub mod signature;

pub use amount::Amount;
pub use chain::ChainId;
pub use error::HubError;
pub use event::{EventCursor, EventKey, EventType, NewEvent, StoredEvent};
pub use keys::{HubKeysFile, KeyMaterialFile};
pub use oracle::{OracleHealth, OracleStatus};
pub use order::{
    validate_distinct_chains, NewOrder, Order, OrderFilter, OrderPatch, OrderStatus, Page,
    SameChainError,
};
pub use signature::{AddSignaturesOutcome, OrderSignature};
