//! `GET /api/keys` (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDto {
    pub kid: String,
    pub public_key_pem: String,
    pub fingerprint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysResponse {
    pub hub_id: String,
    pub current: KeyDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<KeyDto>,
}

pub async fn keys(State(state): State<Arc<GatewayState>>) -> Json<KeysResponse> {
    let current = state.keys.current();
    let next = state.keys.next();
    Json(KeysResponse {
        hub_id: state.keys.hub_id.clone(),
        current: KeyDto {
            kid: current.kid.clone(),
            public_key_pem: current.public_key_pem.clone(),
            fingerprint: current.fingerprint(),
        },
        next: next.map(|k| KeyDto {
            kid: k.kid.clone(),
            public_key_pem: k.public_key_pem.clone(),
            fingerprint: k.fingerprint(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::sample_state;
    use sha2::{Digest, Sha256};

    #[tokio::test]
    async fn fingerprint_is_sha256_of_the_pem_text_not_the_raw_key_bytes() {
        let state = sample_state();
        let Json(body) = keys(State(state.clone())).await;
        let expected = hex::encode(Sha256::digest(body.current.public_key_pem.as_bytes()));
        assert_eq!(body.current.fingerprint, expected);
        assert!(body.next.is_none());
        assert_eq!(body.hub_id, "hub-test");
    }
}
