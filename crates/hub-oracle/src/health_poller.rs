//! Oracle Health Poller (C8, spec §4.8).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hub_crypto::RequestSigner;
use hub_net::JsonClient;
use hub_scheduler::PollerTask;
use hub_telemetry::metrics::ORACLE_HEALTH;
use hub_types::OracleHealth;
use tokio_util::sync::CancellationToken;

use crate::registry::OracleRegistry;
use crate::wire::RawHealthResponse;

pub struct HealthPoller {
    client: Arc<JsonClient>,
    signer: Arc<RequestSigner>,
    registry: Arc<OracleRegistry>,
    interval: Duration,
}

impl HealthPoller {
    pub fn new(
        client: Arc<JsonClient>,
        signer: Arc<RequestSigner>,
        registry: Arc<OracleRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            signer,
            registry,
            interval,
        }
    }
}

#[async_trait]
impl PollerTask<String, OracleHealth> for HealthPoller {
    async fn fetch_one(&self, server: &String, cancel: CancellationToken) -> Option<OracleHealth> {
        let now = Utc::now();
        let url = format!("{server}/api/health");

        let headers = match self.signer.sign_get("GET", &url) {
            Ok(headers) => headers,
            Err(error) => {
                tracing::warn!(%server, %error, "could not sign oracle health request");
                return Some(OracleHealth::unknown(server, now));
            }
        };
        let pairs = headers.as_pairs();

        match self
            .client
            .get_json::<RawHealthResponse>(server, "/api/health", &cancel, &pairs)
            .await
        {
            Ok(raw) => Some(raw.into_oracle_health(server, now)),
            Err(error) => {
                tracing::warn!(%server, %error, "oracle health check failed");
                Some(OracleHealth::unknown(server, now))
            }
        }
    }

    async fn on_round(&self, successes: Vec<OracleHealth>) {
        for health in successes {
            ORACLE_HEALTH
                .with_label_values(&[health.url.as_str()])
                .set(health.is_healthy() as i64);
            self.registry.update(&health.url, health);
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
