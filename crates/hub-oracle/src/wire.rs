//! Wire payloads returned by an oracle's `/api/orders` and `/api/health`.

use chrono::{DateTime, Utc};
use hub_types::{Amount, ChainId, OracleHealth, OracleStatus, OrderStatus};
use serde::Deserialize;
use uuid::Uuid;

/// One oracle's attestation of one order, as returned from `/api/orders`.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderWithSignature {
    pub id: Uuid,
    pub source: ChainId,
    pub dest: ChainId,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub relayer_fee: Amount,
    pub origin_trx_hash: String,
    #[serde(default)]
    pub destination_trx_hash: Option<String>,
    pub oracle_accept_to_relay: bool,
    pub status: OrderStatus,
    pub signature: String,
}

/// `/api/orders` may respond as a bare array or `{data: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrdersPayload {
    Bare(Vec<OrderWithSignature>),
    Wrapped { data: Vec<OrderWithSignature> },
}

impl OrdersPayload {
    pub fn into_orders(self) -> Vec<OrderWithSignature> {
        match self {
            OrdersPayload::Bare(orders) => orders,
            OrdersPayload::Wrapped { data } => data,
        }
    }
}

/// `/api/health`'s loosely-typed response. Unlike `OrdersPayload`, individual
/// fields are allowed to be missing or malformed — callers default them
/// (spec §4.8: "Timestamps default to now; fee values default to 0 when
/// malformed") rather than rejecting the whole response.
#[derive(Debug, Deserialize)]
pub struct RawHealthResponse {
    pub status: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "relayerFeeSolana")]
    pub relayer_fee_solana: Option<String>,
    #[serde(rename = "relayerFeeQubic")]
    pub relayer_fee_qubic: Option<String>,
}

impl RawHealthResponse {
    pub fn into_oracle_health(self, url: &str, now: DateTime<Utc>) -> OracleHealth {
        let status = match self.status.as_deref() {
            Some("ok") => OracleStatus::Ok,
            _ => OracleStatus::Down,
        };
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        let relayer_fee_s = self
            .relayer_fee_solana
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Amount::zero);
        let relayer_fee_q = self
            .relayer_fee_qubic
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Amount::zero);

        OracleHealth {
            url: url.to_string(),
            status,
            timestamp,
            relayer_fee_s,
            relayer_fee_q,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array_payload() {
        let json = r#"[]"#;
        let payload: OrdersPayload = serde_json::from_str(json).unwrap();
        assert!(payload.into_orders().is_empty());
    }

    #[test]
    fn parses_wrapped_payload() {
        let json = r#"{"data": []}"#;
        let payload: OrdersPayload = serde_json::from_str(json).unwrap();
        assert!(payload.into_orders().is_empty());
    }

    #[test]
    fn health_response_defaults_malformed_fees_to_zero() {
        let raw = RawHealthResponse {
            status: Some("ok".into()),
            timestamp: None,
            relayer_fee_solana: Some("not-a-number".into()),
            relayer_fee_qubic: None,
        };
        let now = Utc::now();
        let health = raw.into_oracle_health("http://oracle", now);
        assert_eq!(health.status, OracleStatus::Ok);
        assert_eq!(health.timestamp, now);
        assert_eq!(health.relayer_fee_s, Amount::zero());
        assert_eq!(health.relayer_fee_q, Amount::zero());
    }
}
