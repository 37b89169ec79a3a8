//! Chain-S WebSocket Log Listener (C11, spec §4.11).
//!
//! State machine per connection: `Idle -> Connecting -> Subscribing ->
//! Subscribed`, reconnecting on any error from any state. Mirrors the
//! reconnect-loop-around-a-stream shape of `danipolo-liquidator-rust`'s
//! `event_listener.rs`, generalized from alloy's typed log subscription
//! to Solana's raw `logsSubscribe` JSON-RPC pubsub protocol carried over
//! `tokio-tungstenite` instead of a provider crate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use hub_repo::EventsRepository;
use hub_telemetry::metrics::{EVENTS_INGESTED_TOTAL, WS_RECONNECTS_TOTAL};
use hub_types::{ChainId, NewEvent};
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::decode::{decode_program_data_line, DecodedEvent};

pub struct WsListenerConfig {
    pub primary_url: String,
    pub fallback_url: Option<String>,
    pub program_address: String,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive primary-connection failures before switching to the
    /// fallback URL.
    pub max_consecutive_primary_failures: u32,
    /// How long to stay on the fallback before trying the primary again.
    pub primary_retry_after: Duration,
}

impl Default for WsListenerConfig {
    fn default() -> Self {
        Self {
            primary_url: String::new(),
            fallback_url: None,
            program_address: String::new(),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_consecutive_primary_failures: 3,
            primary_retry_after: Duration::from_secs(60),
        }
    }
}

struct Inner {
    config: WsListenerConfig,
    events: Arc<dyn EventsRepository>,
}

/// Owns the listener's single background task and cancellation token,
/// the same lifecycle shape as `hub_scheduler::Poller`.
pub struct WsListener {
    inner: Arc<Inner>,
    handle: AsyncMutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl WsListener {
    pub fn new(config: WsListenerConfig, events: Arc<dyn EventsRepository>) -> Self {
        Self {
            inner: Arc::new(Inner { config, events }),
            handle: AsyncMutex::new(None),
        }
    }

    pub async fn start(&self) {
        let mut guard = self.handle.lock().await;
        assert!(guard.is_none(), "ws listener started twice without an intervening stop()");

        let cancel = CancellationToken::new();
        let inner = self.inner.clone();
        let loop_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            reconnect_loop(inner, loop_cancel).await;
        });
        *guard = Some((join, cancel));
    }

    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        if let Some((join, cancel)) = handle {
            cancel.cancel();
            let _ = join.await;
        }
    }
}

async fn reconnect_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    let mut consecutive_primary_failures = 0u32;
    let mut using_fallback = false;
    let mut primary_retry_at: Option<Instant> = None;
    let mut backoff = inner.config.base_backoff;

    loop {
        if cancel.is_cancelled() {
            return;
        }

        if using_fallback {
            if let Some(deadline) = primary_retry_at {
                if Instant::now() >= deadline {
                    using_fallback = false;
                    consecutive_primary_failures = 0;
                    primary_retry_at = None;
                }
            }
        }

        let url = if using_fallback {
            match &inner.config.fallback_url {
                Some(url) => url.clone(),
                None => inner.config.primary_url.clone(),
            }
        } else {
            inner.config.primary_url.clone()
        };
        let endpoint_label = if using_fallback { "fallback" } else { "primary" };

        match run_connection(&inner, &url, &cancel).await {
            ConnectionOutcome::ShuttingDown => return,
            ConnectionOutcome::Failed(error) => {
                warn!(%error, endpoint = endpoint_label, "chain-s websocket connection failed");
                WS_RECONNECTS_TOTAL.with_label_values(&[endpoint_label]).inc();

                if !using_fallback {
                    consecutive_primary_failures += 1;
                    if consecutive_primary_failures >= inner.config.max_consecutive_primary_failures
                        && inner.config.fallback_url.is_some()
                    {
                        using_fallback = true;
                        primary_retry_at = Some(Instant::now() + inner.config.primary_retry_after);
                        debug!("chain-s websocket switching to fallback endpoint");
                    }
                }

                let jitter = backoff.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
                let delay = backoff + jitter;
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return,
                }
                backoff = (backoff * 2).min(inner.config.max_backoff);
            }
        }
    }
}

enum ConnectionOutcome {
    /// Cancellation fired; reconnect loop should exit, not retry.
    ShuttingDown,
    Failed(anyhow::Error),
}

async fn run_connection(inner: &Arc<Inner>, url: &str, cancel: &CancellationToken) -> ConnectionOutcome {
    let (stream, _response) = match tokio_tungstenite::connect_async(url).await {
        Ok(pair) => pair,
        Err(error) => return ConnectionOutcome::Failed(error.into()),
    };
    let (mut sink, mut source) = stream.split();

    let subscribe_request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [inner.config.program_address] },
            { "commitment": "confirmed" },
        ],
    });
    if let Err(error) = sink.send(Message::Text(subscribe_request.to_string())).await {
        return ConnectionOutcome::Failed(error.into());
    }

    let subscription_id: i64 = loop {
        tokio::select! {
            message = source.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(value) = serde_json::from_str::<Value>(&text) else { continue };
                        if let Some(id) = value.get("result").and_then(Value::as_i64) {
                            break id;
                        }
                        if let Some(error) = value.get("error") {
                            return ConnectionOutcome::Failed(anyhow::anyhow!("logsSubscribe rejected: {error}"));
                        }
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => return ConnectionOutcome::Failed(error.into()),
                    None => return ConnectionOutcome::Failed(anyhow::anyhow!("socket closed before subscription result")),
                }
            }
            _ = cancel.cancelled() => return ConnectionOutcome::ShuttingDown,
        }
    };
    debug!(subscription_id, url, "chain-s websocket subscribed");

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, DecodedEvent)>();
    let events = inner.events.clone();
    let consumer = tokio::spawn(async move {
        while let Some((signature, decoded)) = rx.recv().await {
            if ignore_on_websocket(&decoded) {
                continue;
            }
            if let Err(error) = persist_decoded(&events, signature, decoded).await {
                warn!(%error, "failed persisting chain-s websocket event");
            }
        }
    });

    let outcome = loop {
        tokio::select! {
            message = source.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(error) = handle_notification(&text, &tx) {
                            warn!(%error, "failed handling chain-s logsNotification");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break ConnectionOutcome::Failed(anyhow::anyhow!("socket closed by server"));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => break ConnectionOutcome::Failed(error.into()),
                }
            }
            _ = cancel.cancelled() => {
                let unsubscribe = json!({
                    "jsonrpc": "2.0",
                    "id": 2,
                    "method": "logsUnsubscribe",
                    "params": [subscription_id],
                });
                let _ = sink.send(Message::Text(unsubscribe.to_string())).await;
                let _ = sink.close().await;
                break ConnectionOutcome::ShuttingDown;
            }
        }
    };

    drop(tx);
    let _ = consumer.await;
    outcome
}

fn handle_notification(text: &str, tx: &mpsc::UnboundedSender<(String, DecodedEvent)>) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("method").and_then(Value::as_str) != Some("logsNotification") {
        return Ok(());
    }
    let params: crate::wire::LogsNotificationParams = serde_json::from_value(
        value
            .get("params")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("logsNotification missing params"))?,
    )?;
    let notification = params.result.value;
    if notification.err.is_some() {
        return Ok(());
    }

    for line in &notification.logs {
        if let Some(decoded) = decode_program_data_line(line) {
            let _ = tx.send((notification.signature.clone(), decoded));
        }
    }
    Ok(())
}

/// Inbound transfers are ignored on the websocket path: the transaction
/// poller is the system of record for them (spec §4.11 step 5), so
/// persisting here too would just race `events.create`'s dedup check.
fn ignore_on_websocket(decoded: &DecodedEvent) -> bool {
    matches!(decoded, DecodedEvent::Inbound(_))
}

async fn persist_decoded(
    events: &Arc<dyn EventsRepository>,
    signature: String,
    decoded: DecodedEvent,
) -> Result<(), hub_repo::RepoError> {
    let event_type = decoded.event_type();
    let nonce = decoded.nonce_hex();
    let event = NewEvent {
        signature,
        slot: None,
        chain: ChainId::ChainS,
        event_type,
        nonce,
        payload: json!({ "decoded": format!("{decoded:?}") }),
    };

    if events.create(event).await?.is_some() {
        EVENTS_INGESTED_TOTAL
            .with_label_values(&["chain-s-ws", event_type.as_str()])
            .inc();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::OutboundPayload;

    fn sample_payload() -> OutboundPayload {
        OutboundPayload {
            network_in: 1,
            network_out: 2,
            token_in: [0u8; 32],
            token_out: [0u8; 32],
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            relayer_fee: 1,
            nonce: [3u8; 32],
        }
    }

    #[test]
    fn ignores_inbound_events_over_the_websocket() {
        assert!(ignore_on_websocket(&DecodedEvent::Inbound(sample_payload())));
    }

    #[test]
    fn does_not_ignore_outbound_or_override_outbound() {
        assert!(!ignore_on_websocket(&DecodedEvent::Outbound(sample_payload())));
        assert!(!ignore_on_websocket(&DecodedEvent::OverrideOutbound(
            crate::decode::OverrideOutboundPayload {
                to: [2u8; 32],
                relayer_fee: 1,
                nonce: [3u8; 32],
            }
        )));
    }
}
