//! On-chain bridge events, deduplicated on `(signature, type, nonce)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Outbound,
    OverrideOutbound,
    Inbound,
    Lock,
    OverrideLock,
    Unlock,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Outbound => "outbound",
            EventType::OverrideOutbound => "override-outbound",
            EventType::Inbound => "inbound",
            EventType::Lock => "lock",
            EventType::OverrideLock => "override-lock",
            EventType::Unlock => "unlock",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub signature: String,
    pub slot: Option<u64>,
    pub chain: ChainId,
    pub event_type: EventType,
    /// Lowercase 64-char hex.
    pub nonce: String,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    pub signature: String,
    pub slot: Option<u64>,
    pub chain: ChainId,
    pub event_type: EventType,
    pub nonce: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventKey<'a> {
    pub signature: &'a str,
    pub event_type: EventType,
    pub nonce: &'a str,
}

#[derive(Clone, Copy, Debug)]
pub struct EventCursor {
    pub created_after: DateTime<Utc>,
    pub after_id: i64,
}
