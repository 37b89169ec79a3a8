#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Chain-Q (Qubic-like) event ingestion (C12).

mod error;
pub mod event_poller;
pub mod wire;

pub use error::ChainQubicError;
pub use event_poller::EventPoller;
pub use wire::{ChainQEventsPayload, RawChainQEvent};
