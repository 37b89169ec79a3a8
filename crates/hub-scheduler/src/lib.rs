#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Clock, cancellable sleeps, and the generic round-based poller (C1).

pub mod clock;
mod poller;

pub use clock::now;
pub use poller::{Poller, PollerConfig, PollerTask};
pub use tokio_util::sync::CancellationToken;
