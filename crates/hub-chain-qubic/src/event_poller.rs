//! Chain-Q Event Poller (C12, spec §4.12).
//!
//! Same windowed-poll shape as chain-S's transaction poller but without
//! pagination or a tiered backoff: a single endpoint, GET once per round,
//! dedup against what's already stored, persist the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hub_net::JsonClient;
use hub_repo::EventsRepository;
use hub_scheduler::PollerTask;
use hub_telemetry::metrics::EVENTS_INGESTED_TOTAL;
use hub_types::{ChainId, EventType, NewEvent};
use tokio_util::sync::CancellationToken;

use crate::wire::{ChainQEventsPayload, RawChainQEvent};

pub struct EventPoller {
    client: Arc<JsonClient>,
    endpoint_url: String,
    events: Arc<dyn EventsRepository>,
    interval: Duration,
}

impl EventPoller {
    pub fn new(client: Arc<JsonClient>, endpoint_url: String, events: Arc<dyn EventsRepository>, interval: Duration) -> Self {
        Self { client, endpoint_url, events, interval }
    }

    async fn persist(&self, event_type: EventType, entries: Vec<RawChainQEvent>) -> usize {
        let signatures: Vec<String> = entries.iter().filter_map(|e| e.trx_hash.clone()).collect();
        let existing = match self.events.find_existing_signatures(&signatures).await {
            Ok(existing) => existing.into_iter().collect::<std::collections::HashSet<_>>(),
            Err(error) => {
                tracing::warn!(%error, "failed checking existing chain-q signatures");
                return 0;
            }
        };

        let mut persisted = 0usize;
        for entry in entries {
            let Some(trx_hash) = entry.trx_hash else { continue };
            if existing.contains(&trx_hash) {
                continue;
            }

            let event = NewEvent {
                signature: trx_hash.clone(),
                slot: entry.tick,
                chain: ChainId::ChainQ,
                event_type,
                nonce: entry.nonce.unwrap_or_default(),
                payload: entry.extra,
            };

            match self.events.create(event).await {
                Ok(Some(_)) => {
                    persisted += 1;
                    EVENTS_INGESTED_TOTAL
                        .with_label_values(&["chain-q-poller", event_type.as_str()])
                        .inc();
                }
                Ok(None) => {}
                Err(error) => tracing::warn!(%error, %trx_hash, "failed persisting chain-q event"),
            }
        }
        persisted
    }
}

fn classify(event_type: &str) -> Option<EventType> {
    match event_type {
        "lock" => Some(EventType::Lock),
        "override-lock" => Some(EventType::OverrideLock),
        "unlock" => Some(EventType::Unlock),
        _ => None,
    }
}

#[async_trait]
impl PollerTask<(), usize> for EventPoller {
    async fn fetch_one(&self, _server: &(), cancel: CancellationToken) -> Option<usize> {
        let payload = self
            .client
            .get_json::<ChainQEventsPayload>(&self.endpoint_url, "", &cancel, &[])
            .await
            .map_err(|error| tracing::warn!(%error, "chain-q events fetch failed"))
            .ok()?;

        let mut by_type: HashMap<EventType, Vec<RawChainQEvent>> = HashMap::new();
        for entry in payload.into_events() {
            if entry.trx_hash.is_none() {
                continue;
            }
            let Some(event_type) = entry.event_type.as_deref().and_then(classify) else {
                continue;
            };
            by_type.entry(event_type).or_default().push(entry);
        }

        let mut total = 0usize;
        for (event_type, entries) in by_type {
            total += self.persist(event_type, entries).await;
        }
        Some(total)
    }

    async fn on_round(&self, successes: Vec<usize>) {
        if let Some(total) = successes.first() {
            tracing::debug!(persisted = total, "chain-q poller round complete");
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
