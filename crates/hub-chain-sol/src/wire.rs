//! Wire payloads for the chain-S transaction history RPC (spec §4.10).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TransactionPage {
    pub data: Vec<RawTransaction>,
    #[serde(rename = "paginationToken")]
    pub pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    pub signature: String,
    pub slot: u64,
    pub meta: TransactionMeta,
}

#[derive(Debug, Deserialize)]
pub struct TransactionMeta {
    pub err: Option<serde_json::Value>,
    #[serde(rename = "logMessages", default)]
    pub log_messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogsNotificationParams {
    pub result: LogsNotificationResult,
}

#[derive(Debug, Deserialize)]
pub struct LogsNotificationResult {
    pub value: LogsNotificationValue,
}

#[derive(Debug, Deserialize)]
pub struct LogsNotificationValue {
    pub signature: String,
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Vec<String>,
}
