#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Pooled HTTP JSON client (C2).

mod client;

pub use client::{is_retryable, HttpError, JsonClient};

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn get_json_surfaces_non_2xx_as_http_status() {
        // No server listening on this port; connection refused surfaces
        // as a Transport error, exercising the error path end to end.
        let client = JsonClient::new();
        let cancel = CancellationToken::new();
        let result: Result<serde_json::Value, _> = client
            .get_json("http://127.0.0.1:1", "/nope", &cancel, &[])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_short_circuits_the_request() {
        let client = JsonClient::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<serde_json::Value, _> = client
            .get_json("http://127.0.0.1:1", "/nope", &cancel, &[])
            .await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }
}
