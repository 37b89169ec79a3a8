#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! HTTP surface for the bridge hub (C-nothing in the component table — this
//! crate is the operator-facing read surface spec.md §6 describes: orders,
//! signatures, events, keys, health, and fee estimation).

mod error;
mod rate_limit;
mod routes;
mod server;
mod state;

pub use error::AppError;
pub use server::{run_server, GatewayConfig};
pub use state::GatewayState;
