//! Wire payload for the chain-Q events endpoint (spec §4.12).

use serde::Deserialize;

/// One entry from the chain-Q events endpoint. Entries missing `trxHash`
/// are skipped by the poller rather than rejected (spec §4.12).
#[derive(Clone, Debug, Deserialize)]
pub struct RawChainQEvent {
    #[serde(rename = "trxHash")]
    pub trx_hash: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub nonce: Option<String>,
    pub tick: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// The events endpoint may respond as a bare array or `{data: [...]}`,
/// the same shape as the oracle orders endpoint (spec §4.9, §4.12).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChainQEventsPayload {
    Bare(Vec<RawChainQEvent>),
    Wrapped { data: Vec<RawChainQEvent> },
}

impl ChainQEventsPayload {
    pub fn into_events(self) -> Vec<RawChainQEvent> {
        match self {
            ChainQEventsPayload::Bare(events) => events,
            ChainQEventsPayload::Wrapped { data } => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array_payload() {
        let body = r#"[{"trxHash":"abc","type":"lock","nonce":"n1","tick":100}]"#;
        let payload: ChainQEventsPayload = serde_json::from_str(body).unwrap();
        let events = payload.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trx_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn parses_wrapped_payload() {
        let body = r#"{"data":[{"trxHash":"abc","type":"unlock"}]}"#;
        let payload: ChainQEventsPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.into_events().len(), 1);
    }
}
