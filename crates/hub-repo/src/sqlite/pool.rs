//! Pool construction and schema migration.
//!
//! No migration framework — the teacher doesn't carry one for its
//! `redb` storage either, and the schema here is small and additive
//! enough that plain embedded `CREATE TABLE IF NOT EXISTS` is simpler
//! than pulling in `sqlx::migrate!` for three tables.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    dest TEXT NOT NULL,
    from_addr TEXT NOT NULL,
    to_addr TEXT NOT NULL,
    amount TEXT NOT NULL,
    relayer_fee TEXT NOT NULL,
    origin_trx_hash TEXT NOT NULL UNIQUE,
    destination_trx_hash TEXT,
    source_nonce TEXT NOT NULL,
    source_payload TEXT NOT NULL,
    failure_reason_public TEXT,
    oracle_accept_to_relay INTEGER NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (source != dest)
);

CREATE TABLE IF NOT EXISTS order_signatures (
    order_id TEXT NOT NULL REFERENCES orders(id),
    signature TEXT NOT NULL,
    UNIQUE(order_id, signature)
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    signature TEXT NOT NULL,
    slot INTEGER,
    chain TEXT NOT NULL,
    event_type TEXT NOT NULL,
    nonce TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(signature, event_type, nonce)
);

CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at, id);
"#;

/// Opens (creating if absent) the sqlite file at `path` and runs the
/// embedded schema. `path` is the `SQLITE_DB_FILE` config value.
pub async fn connect(path: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    Ok(pool)
}
