//! Process configuration, loaded from environment variables (spec.md §6
//! "Configuration"). Grounded on the teacher's `clap::Parser` + `env`
//! attribute style (`crates/node/src/bin/guardian.rs`'s `GuardianOpts`),
//! generalized from one override flag to the full recognized-keys table.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hub-node", about = "Bridge hub daemon")]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 100)]
    pub rate_limit_max: u32,

    #[arg(long, env = "SQLITE_DB_FILE", default_value = "hub.sqlite3")]
    pub sqlite_db_file: String,

    #[arg(long, env = "ORACLE_URLS", default_value = "")]
    pub oracle_urls: String,
    #[arg(long, env = "ORACLE_SIGNATURE_THRESHOLD", default_value_t = 0.67)]
    pub oracle_signature_threshold: f64,
    #[arg(long, env = "ORACLE_COUNT", default_value_t = 1)]
    pub oracle_count: usize,

    #[arg(long, env = "HUB_KEYS_FILE", default_value = "hub-keys.json")]
    pub hub_keys_file: String,

    #[arg(long, env = "POLLER_INTERVAL_MS", default_value_t = 5_000)]
    pub poller_interval_ms: u64,
    #[arg(long, env = "POLLER_REQUEST_TIMEOUT_MS", default_value_t = 3_000)]
    pub poller_request_timeout_ms: u64,
    #[arg(long, env = "POLLER_JITTER_MS", default_value_t = 250)]
    pub poller_jitter_ms: u64,

    #[arg(long, env = "HELIUS_RPC_URL", default_value = "")]
    pub helius_rpc_url: String,
    #[arg(long, env = "HELIUS_POLLER_ENABLED", default_value_t = false)]
    pub helius_poller_enabled: bool,
    #[arg(long, env = "HELIUS_POLLER_INTERVAL_MS", default_value_t = 10_000)]
    pub helius_poller_interval_ms: u64,
    #[arg(long, env = "HELIUS_POLLER_LOOKBACK_SECONDS", default_value_t = 120)]
    pub helius_poller_lookback_seconds: i64,
    #[arg(long, env = "HELIUS_POLLER_TIMEOUT_MS", default_value_t = 5_000)]
    pub helius_poller_timeout_ms: u64,
    #[arg(long, env = "HELIUS_POLLER_RETRY_DELAY_MS", default_value_t = 2_000)]
    pub helius_poller_retry_delay_ms: u64,
    #[arg(long, env = "TOKEN_MINT", default_value = "")]
    pub token_mint: String,

    #[arg(long, env = "SOLANA_WS_URL", default_value = "")]
    pub solana_ws_url: String,
    #[arg(long, env = "SOLANA_FALLBACK_WS_URL")]
    pub solana_fallback_ws_url: Option<String>,
    #[arg(long, env = "SOLANA_LISTENER_ENABLED", default_value_t = false)]
    pub solana_listener_enabled: bool,
    #[arg(long, env = "SOLANA_WS_RECONNECT_BASE_MS", default_value_t = 1_000)]
    pub solana_ws_reconnect_base_ms: u64,
    #[arg(long, env = "SOLANA_WS_RECONNECT_MAX_MS", default_value_t = 30_000)]
    pub solana_ws_reconnect_max_ms: u64,
    #[arg(long, env = "SOLANA_WS_FALLBACK_RETRY_MS", default_value_t = 60_000)]
    pub solana_ws_fallback_retry_ms: u64,

    #[arg(long, env = "QUBIC_RPC_URL", default_value = "")]
    pub qubic_rpc_url: String,
    #[arg(long, env = "QUBIC_POLLER_ENABLED", default_value_t = false)]
    pub qubic_poller_enabled: bool,
    #[arg(long, env = "QUBIC_POLLER_INTERVAL_MS", default_value_t = 10_000)]
    pub qubic_poller_interval_ms: u64,
    #[arg(long, env = "QUBIC_POLLER_TIMEOUT_MS", default_value_t = 5_000)]
    pub qubic_poller_timeout_ms: u64,
}

impl Config {
    pub fn oracle_url_list(&self) -> Vec<String> {
        self.oracle_urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
