//! Pooled, origin-keyed JSON HTTP client (C2, spec §4.2).
//!
//! `reqwest::Client` already pools and reuses idle connections per origin;
//! what it does not do is bound *concurrency* per origin, so we layer a
//! `tokio::sync::Semaphore` keyed by origin on top, following the same
//! "one client, one cheap per-origin guard" shape `ioi-relayer::Gateway`
//! uses for its retry loop.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

const DEFAULT_PER_ORIGIN_CONCURRENCY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {code}")]
    Status { code: u16 },
    #[error("request cancelled")]
    Cancelled,
}

impl HttpError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { code } => Some(*code),
            _ => None,
        }
    }
}

pub struct JsonClient {
    client: Client,
    origin_limits: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_origin_concurrency: usize,
}

impl JsonClient {
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_PER_ORIGIN_CONCURRENCY)
    }

    pub fn with_concurrency(per_origin_concurrency: usize) -> Self {
        Self {
            client: Client::builder()
                .pool_max_idle_per_host(per_origin_concurrency)
                .build()
                .unwrap_or_else(|_| Client::new()),
            origin_limits: Mutex::new(HashMap::new()),
            per_origin_concurrency,
        }
    }

    async fn limiter_for(&self, origin: &str) -> Arc<Semaphore> {
        let mut limits = self.origin_limits.lock().await;
        limits
            .entry(origin.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_origin_concurrency)))
            .clone()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        origin: &str,
        path: &str,
        cancel: &CancellationToken,
        headers: &[(&str, String)],
    ) -> Result<T, HttpError> {
        let url = format!("{origin}{path}");
        let limiter = self.limiter_for(origin).await;
        let _permit = race_cancel(limiter.acquire(), cancel).await?;

        let mut req = self.client.get(&url);
        for (name, value) in headers {
            req = req.header(*name, value.clone());
        }
        send_and_decode(req, cancel).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        origin: &str,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
        headers: &[(&str, String)],
    ) -> Result<T, HttpError> {
        let url = format!("{origin}{path}");
        let limiter = self.limiter_for(origin).await;
        let _permit = race_cancel(limiter.acquire(), cancel).await?;

        let mut req = self.client.post(&url).json(body);
        for (name, value) in headers {
            req = req.header(*name, value.clone());
        }
        send_and_decode(req, cancel).await
    }

    /// Raw POST for callers that need the body bytes for signing before
    /// the request is built (the oracle polling pipeline signs the
    /// canonical string before attaching headers, not the `reqwest`
    /// builder's output).
    pub fn raw(&self) -> &Client {
        &self.client
    }

    /// No connection pools to explicitly close — `reqwest::Client`'s
    /// `Drop` tears its pool down. This exists so callers have an
    /// explicit, orderly shutdown step to call (spec §5 shutdown order),
    /// matching the repository/websocket "close" calls it's listed
    /// alongside.
    pub async fn shutdown(&self) {
        tracing::debug!("http client shutdown");
    }
}

impl Default for JsonClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn race_cancel<'a>(
    acquire: impl std::future::Future<Output = Result<tokio::sync::SemaphorePermit<'a>, tokio::sync::AcquireError>>,
    cancel: &CancellationToken,
) -> Result<tokio::sync::SemaphorePermit<'a>, HttpError> {
    tokio::select! {
        permit = acquire => permit.map_err(|_| HttpError::Cancelled),
        _ = cancel.cancelled() => Err(HttpError::Cancelled),
    }
}

async fn send_and_decode<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<T, HttpError> {
    let response = tokio::select! {
        resp = req.send() => resp?,
        _ = cancel.cancelled() => return Err(HttpError::Cancelled),
    };

    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status { code: status.as_u16() });
    }

    let body = tokio::select! {
        body = response.json::<T>() => body?,
        _ = cancel.cancelled() => return Err(HttpError::Cancelled),
    };
    Ok(body)
}

/// Convenience for callers that just want to know "is this a retryable
/// transport blip" without matching on every variant.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
