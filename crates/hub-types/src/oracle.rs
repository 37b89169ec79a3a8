//! In-memory oracle health snapshots (C6 Oracle Registry).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleStatus {
    Ok,
    Down,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleHealth {
    pub url: String,
    pub status: OracleStatus,
    pub timestamp: DateTime<Utc>,
    pub relayer_fee_s: Amount,
    pub relayer_fee_q: Amount,
}

impl OracleHealth {
    /// Initial registry state: unknown oracle, assumed down (spec §4.6).
    pub fn unknown(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            status: OracleStatus::Down,
            timestamp: now,
            relayer_fee_s: Amount::zero(),
            relayer_fee_q: Amount::zero(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, OracleStatus::Ok)
    }
}
