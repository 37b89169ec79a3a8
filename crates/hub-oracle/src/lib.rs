#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Oracle fleet: registry (C6), reconciliator (C7), and the health/orders
//! pollers (C8, C9).

mod error;
mod health_poller;
mod orders_poller;
mod reconcile;
mod registry;
mod wire;

pub use error::ReconcileError;
pub use health_poller::HealthPoller;
pub use orders_poller::{compute_required_signatures, OrdersPoller};
pub use reconcile::reconcile;
pub use registry::OracleRegistry;
pub use wire::{OrderWithSignature, OrdersPayload, RawHealthResponse};
