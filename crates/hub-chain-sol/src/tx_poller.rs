//! Chain-S Transaction Poller (C10, spec §4.10).
//!
//! A single-logical-server poller: `hub_scheduler::Poller` is instantiated
//! with exactly one server value (`()`) since all the state this poller
//! needs — backoff tier, degraded mode, the last successful window end —
//! lives on `TxPoller` itself rather than being split across servers. The
//! windowed-retry-with-jittered-backoff shape follows the same idiom
//! `chainflip-backend`'s witness modules use for chain-tracking pollers,
//! generalized to Solana's HTTP transaction-history API instead of an RPC
//! client crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_net::JsonClient;
use hub_repo::EventsRepository;
use hub_scheduler::PollerTask;
use hub_telemetry::metrics::EVENTS_INGESTED_TOTAL;
use hub_types::{ChainId, NewEvent};
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_program_data_line;
use crate::wire::{RawTransaction, TransactionPage};

const BACKOFF_TIER_MULTIPLIERS: [u32; 3] = [1, 2, 3];
const MAX_BACKOFF_TIER: usize = BACKOFF_TIER_MULTIPLIERS.len() - 1;
const WINDOW_OVERLAP: chrono::Duration = chrono::Duration::seconds(60);
const EXTRA_PAGE_RETRIES: u32 = 2;

pub struct TxPoller {
    client: Arc<JsonClient>,
    rpc_url: String,
    events: Arc<dyn EventsRepository>,
    token_mint: String,
    base_interval: Duration,
    retry_delay: Duration,
    tier: AtomicUsize,
    degraded: AtomicBool,
    last_success_end: Mutex<DateTime<Utc>>,
}

impl TxPoller {
    pub fn new(
        client: Arc<JsonClient>,
        rpc_url: String,
        events: Arc<dyn EventsRepository>,
        token_mint: String,
        base_interval: Duration,
        retry_delay: Duration,
        lookback_seconds: i64,
    ) -> Self {
        Self {
            client,
            rpc_url,
            events,
            token_mint,
            base_interval,
            retry_delay,
            tier: AtomicUsize::new(0),
            degraded: AtomicBool::new(false),
            last_success_end: Mutex::new(Utc::now() - chrono::Duration::seconds(lookback_seconds)),
        }
    }

    async fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        if self.degraded.load(Ordering::SeqCst) {
            let last_end = *self.last_success_end.lock().await;
            (last_end - WINDOW_OVERLAP, now)
        } else {
            let multiplier = BACKOFF_TIER_MULTIPLIERS[self.tier.load(Ordering::SeqCst)] as i64;
            let interval_secs = self.base_interval.as_secs() as i64 * multiplier;
            (now - chrono::Duration::seconds(interval_secs) - WINDOW_OVERLAP, now)
        }
    }

    async fn record_success(&self, end: DateTime<Utc>, processed: usize) {
        self.degraded.store(false, Ordering::SeqCst);
        *self.last_success_end.lock().await = end;
        if processed >= 1 {
            self.tier.store(0, Ordering::SeqCst);
        } else {
            let current = self.tier.load(Ordering::SeqCst);
            self.tier.store((current + 1).min(MAX_BACKOFF_TIER), Ordering::SeqCst);
        }
    }

    fn record_failure(&self) {
        self.degraded.store(true, Ordering::SeqCst);
        self.tier.store(0, Ordering::SeqCst);
    }

    fn current_multiplier(&self) -> u32 {
        BACKOFF_TIER_MULTIPLIERS[self.tier.load(Ordering::SeqCst)]
    }

    async fn fetch_page(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pagination_token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TransactionPage, hub_net::HttpError> {
        #[derive(Serialize)]
        struct Request<'a> {
            token_mint: &'a str,
            start: i64,
            end: i64,
            #[serde(skip_serializing_if = "Option::is_none")]
            pagination_token: Option<&'a str>,
        }

        let request = Request {
            token_mint: &self.token_mint,
            start: start.timestamp(),
            end: end.timestamp(),
            pagination_token,
        };

        let mut attempt = 0;
        loop {
            match self
                .client
                .post_json::<_, TransactionPage>(&self.rpc_url, "", &request, cancel, &[])
                .await
            {
                Ok(page) => return Ok(page),
                Err(error) if attempt < EXTRA_PAGE_RETRIES => {
                    attempt += 1;
                    let jitter = self.retry_delay.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
                    let delay = self.retry_delay + jitter;
                    tracing::warn!(%error, attempt, "retrying chain-s transaction page");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(hub_net::HttpError::Cancelled),
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn process_transaction(&self, tx: &RawTransaction) {
        if tx.meta.err.is_some() || tx.meta.log_messages.is_empty() {
            return;
        }

        for line in &tx.meta.log_messages {
            let Some(decoded) = decode_program_data_line(line) else {
                continue;
            };

            let event_type = decoded.event_type();
            let event = NewEvent {
                signature: tx.signature.clone(),
                slot: Some(tx.slot),
                chain: ChainId::ChainS,
                event_type,
                nonce: decoded.nonce_hex(),
                payload: serde_json::json!({ "decoded": format!("{decoded:?}") }),
            };

            match self.events.create(event).await {
                Ok(Some(_)) => {
                    EVENTS_INGESTED_TOTAL
                        .with_label_values(&["chain-s-poller", event_type.as_str()])
                        .inc();
                }
                Ok(None) => {}
                Err(error) => tracing::warn!(%error, signature = %tx.signature, "failed persisting chain-s event"),
            }
        }
    }
}

#[async_trait]
impl PollerTask<(), usize> for TxPoller {
    async fn fetch_one(&self, _server: &(), cancel: CancellationToken) -> Option<usize> {
        let (start, end) = self.window().await;
        let mut processed = 0usize;
        let mut pagination_token: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let page = match self
                .fetch_page(start, end, pagination_token.as_deref(), &cancel)
                .await
            {
                Ok(page) => page,
                Err(error) => {
                    tracing::warn!(%error, "chain-s transaction page fetch failed");
                    self.record_failure();
                    return None;
                }
            };

            let signatures: Vec<String> = page.data.iter().map(|tx| tx.signature.clone()).collect();
            let existing = match self.events.find_existing_signatures(&signatures).await {
                Ok(existing) => existing,
                Err(error) => {
                    tracing::warn!(%error, "failed checking existing chain-s signatures");
                    self.record_failure();
                    return None;
                }
            };
            let existing: std::collections::HashSet<String> = existing.into_iter().collect();

            let survivors: Vec<&RawTransaction> = page
                .data
                .iter()
                .filter(|tx| !existing.contains(&tx.signature))
                .collect();

            futures::future::join_all(survivors.iter().map(|tx| self.process_transaction(tx))).await;
            processed += survivors.len();

            match page.pagination_token {
                Some(token) => pagination_token = Some(token),
                None => break,
            }
        }

        self.record_success(end, processed).await;
        Some(processed)
    }

    async fn on_round(&self, successes: Vec<usize>) {
        if let Some(processed) = successes.first() {
            tracing::debug!(processed, "chain-s poller round complete");
        }
    }

    fn interval(&self) -> Duration {
        self.base_interval * self.current_multiplier()
    }
}
