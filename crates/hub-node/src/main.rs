#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Bridge hub daemon entry point: wires every poller, the oracle
//! registry, and the HTTP surface together and runs them until shutdown.
//! Grounded on the teacher's `crates/node/src/bin/guardian.rs` startup
//! shape (init tracing first, parse opts, build dependencies, spawn
//! background work, select on a shutdown signal).

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hub_chain_qubic::EventPoller;
use hub_chain_sol::{TxPoller, WsListener, WsListenerConfig};
use hub_crypto::{HubKeys, RequestSigner};
use hub_fee::{ConstantNetworkFeeEstimator, FeeConfig, FeeEstimator, NetworkFeeEstimator, SolanaCostEstimator};
use hub_gateway::{run_server, GatewayConfig, GatewayState};
use hub_net::JsonClient;
use hub_oracle::{HealthPoller, OracleRegistry, OrdersPoller};
use hub_repo::{connect, SqliteEventsRepository, SqliteOrdersRepository};
use hub_scheduler::{Poller, PollerConfig};
use hub_types::Amount;
use tokio::sync::watch;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    hub_telemetry::init_tracing()?;
    let config = Config::parse();
    tracing::info!(target: "hub-node", event = "startup", listen_addr = %config.listen_addr());

    let pool = connect(&config.sqlite_db_file).await?;
    let orders: Arc<dyn hub_repo::OrdersRepository> = Arc::new(SqliteOrdersRepository::new(pool.clone()));
    let events: Arc<dyn hub_repo::EventsRepository> = Arc::new(SqliteEventsRepository::new(pool));

    let keys = Arc::new(HubKeys::load(&config.hub_keys_file)?);
    let signer = Arc::new(RequestSigner::new(keys.clone()));
    let client = Arc::new(JsonClient::new());

    let oracle_urls = config.oracle_url_list();
    let registry = Arc::new(OracleRegistry::new(&oracle_urls));

    let poller_config = |name: &'static str| PollerConfig {
        request_timeout: Duration::from_millis(config.poller_request_timeout_ms),
        jitter: Duration::from_millis(config.poller_jitter_ms),
        name,
    };

    let health_poller = Poller::new(
        oracle_urls.clone(),
        HealthPoller::new(
            client.clone(),
            signer.clone(),
            registry.clone(),
            Duration::from_millis(config.poller_interval_ms),
        ),
        poller_config("oracle_health"),
    );

    let orders_poller = Poller::new(
        oracle_urls.clone(),
        OrdersPoller::new(
            client.clone(),
            signer.clone(),
            registry.clone(),
            orders.clone(),
            Duration::from_millis(config.poller_interval_ms),
            config.oracle_signature_threshold,
            config.oracle_count,
        ),
        poller_config("oracle_orders"),
    );

    health_poller.start().await;
    orders_poller.start().await;

    let tx_poller = if config.helius_poller_enabled {
        let poller = Poller::new(
            vec![()],
            TxPoller::new(
                client.clone(),
                config.helius_rpc_url.clone(),
                events.clone(),
                config.token_mint.clone(),
                Duration::from_millis(config.helius_poller_interval_ms),
                Duration::from_millis(config.helius_poller_retry_delay_ms),
                config.helius_poller_lookback_seconds,
            ),
            PollerConfig {
                request_timeout: Duration::from_millis(config.helius_poller_timeout_ms),
                jitter: Duration::ZERO,
                name: "chain_s_tx",
            },
        );
        poller.start().await;
        Some(poller)
    } else {
        tracing::info!(target: "hub-node", "chain-S transaction poller disabled");
        None
    };

    let ws_listener = if config.solana_listener_enabled {
        let listener = WsListener::new(
            WsListenerConfig {
                primary_url: config.solana_ws_url.clone(),
                fallback_url: config.solana_fallback_ws_url.clone(),
                program_address: config.token_mint.clone(),
                base_backoff: Duration::from_millis(config.solana_ws_reconnect_base_ms),
                max_backoff: Duration::from_millis(config.solana_ws_reconnect_max_ms),
                primary_retry_after: Duration::from_millis(config.solana_ws_fallback_retry_ms),
                ..Default::default()
            },
            events.clone(),
        );
        listener.start().await;
        Some(listener)
    } else {
        tracing::info!(target: "hub-node", "chain-S websocket listener disabled");
        None
    };

    let qubic_poller = if config.qubic_poller_enabled {
        let poller = Poller::new(
            vec![()],
            EventPoller::new(
                client.clone(),
                config.qubic_rpc_url.clone(),
                events.clone(),
                Duration::from_millis(config.qubic_poller_interval_ms),
            ),
            PollerConfig {
                request_timeout: Duration::from_millis(config.qubic_poller_timeout_ms),
                jitter: Duration::ZERO,
                name: "chain_q_events",
            },
        );
        poller.start().await;
        Some(poller)
    } else {
        tracing::info!(target: "hub-node", "chain-Q event poller disabled");
        None
    };

    // Chain Q has no cost estimator yet (spec §4.13 step 4 mocks it to a
    // constant); chain S goes through the real RPC when helius is enabled,
    // otherwise the same zero-constant so `/api/orders/estimate` stays
    // available rather than failing closed.
    let chain_s_network_fee: Arc<dyn NetworkFeeEstimator> = if config.helius_poller_enabled {
        Arc::new(SolanaCostEstimator::new(
            client.clone(),
            config.helius_rpc_url.clone(),
            vec![config.token_mint.clone()],
        ))
    } else {
        Arc::new(ConstantNetworkFeeEstimator(Amount::zero()))
    };
    let chain_q_network_fee: Arc<dyn NetworkFeeEstimator> =
        Arc::new(ConstantNetworkFeeEstimator(Amount::zero()));

    let fee_estimator = Arc::new(FeeEstimator::new(
        FeeConfig::default(),
        registry.clone(),
        chain_s_network_fee,
        chain_q_network_fee,
    ));

    let gateway_state = Arc::new(GatewayState {
        orders,
        events,
        registry,
        fee_estimator,
        keys,
        signature_threshold: config.oracle_signature_threshold,
        oracle_count: config.oracle_count,
        bridge_paused: false,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let gateway_config = GatewayConfig {
        listen_addr: config.listen_addr(),
        rate_limit_max: config.rate_limit_max,
        ..Default::default()
    };
    let gateway_handle = tokio::spawn(run_server(gateway_config, gateway_state, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "hub-node", event = "shutdown", reason = "ctrl-c");
    let _ = shutdown_tx.send(true);

    health_poller.stop().await;
    orders_poller.stop().await;
    if let Some(poller) = tx_poller {
        poller.stop().await;
    }
    if let Some(listener) = ws_listener {
        listener.stop().await;
    }
    if let Some(poller) = qubic_poller {
        poller.stop().await;
    }

    gateway_handle.await??;
    tracing::info!(target: "hub-node", event = "shutdown", reason = "complete");
    Ok(())
}
