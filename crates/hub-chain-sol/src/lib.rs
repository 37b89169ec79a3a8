#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Chain-S (Solana-like) ingestion: the windowed transaction poller
//! (C10), the websocket log listener (C11), and the shared log decoders
//! (C15).

pub mod decode;
mod error;
pub mod tx_poller;
pub mod wire;
pub mod ws_listener;

pub use decode::{decode_bytes, decode_program_data_line, DecodedEvent, OutboundPayload, OverrideOutboundPayload};
pub use error::ChainSolError;
pub use tx_poller::TxPoller;
pub use ws_listener::{WsListener, WsListenerConfig};
