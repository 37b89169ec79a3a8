//! `SqliteEventsRepository`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_types::{ChainId, EventCursor, EventType, NewEvent, StoredEvent};
use sqlx::{Row, SqlitePool};

use crate::error::RepoError;
use crate::traits::EventsRepository;

pub struct SqliteEventsRepository {
    pool: SqlitePool,
}

impl SqliteEventsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn event_type_to_str(event_type: EventType) -> &'static str {
    event_type.as_str()
}

fn event_type_from_str(s: &str) -> Result<EventType, RepoError> {
    Ok(match s {
        "outbound" => EventType::Outbound,
        "override-outbound" => EventType::OverrideOutbound,
        "inbound" => EventType::Inbound,
        "lock" => EventType::Lock,
        "override-lock" => EventType::OverrideLock,
        "unlock" => EventType::Unlock,
        other => return Err(RepoError::Decode(format!("unknown event type: {other}"))),
    })
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<StoredEvent, RepoError> {
    let chain: String = row.try_get("chain")?;
    let event_type: String = row.try_get("event_type")?;
    let payload: String = row.try_get("payload")?;
    let created_at: String = row.try_get("created_at")?;
    let slot: Option<i64> = row.try_get("slot")?;

    Ok(StoredEvent {
        id: row.try_get("id")?,
        signature: row.try_get("signature")?,
        slot: slot.map(|s| s as u64),
        chain: ChainId::from_str(&chain).map_err(|e| RepoError::Decode(e.to_string()))?,
        event_type: event_type_from_str(&event_type)?,
        nonce: row.try_get("nonce")?,
        payload: serde_json::from_str(&payload).map_err(|e| RepoError::Decode(e.to_string()))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| RepoError::Decode(e.to_string()))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl EventsRepository for SqliteEventsRepository {
    async fn create(&self, event: NewEvent) -> Result<Option<StoredEvent>, RepoError> {
        let existing = sqlx::query(
            "SELECT 1 FROM events WHERE signature = ? AND event_type = ? AND nonce = ?",
        )
        .bind(&event.signature)
        .bind(event_type_to_str(event.event_type))
        .bind(&event.nonce)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| RepoError::Decode(e.to_string()))?;
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO events (signature, slot, chain, event_type, nonce, payload, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.signature)
        .bind(event.slot.map(|s| s as i64))
        .bind(event.chain.as_str())
        .bind(event_type_to_str(event.event_type))
        .bind(&event.nonce)
        .bind(&payload)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            // A concurrent insert raced us past the SELECT above.
            Err(sqlx::Error::Database(e)) if e.message().contains("UNIQUE") => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StoredEvent {
            id: result.last_insert_rowid(),
            signature: event.signature,
            slot: event.slot,
            chain: event.chain,
            event_type: event.event_type,
            nonce: event.nonce,
            payload: event.payload,
            created_at,
        }))
    }

    async fn find_existing_signatures(&self, sigs: &[String]) -> Result<Vec<String>, RepoError> {
        if sigs.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = sigs.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql =
            format!("SELECT DISTINCT signature FROM events WHERE signature IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for sig in sigs {
            query = query.bind(sig);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("signature").map_err(RepoError::from))
            .collect()
    }

    async fn list_after_created_at(
        &self,
        cursor: Option<EventCursor>,
        limit: u32,
    ) -> Result<Vec<StoredEvent>, RepoError> {
        let rows = match cursor {
            None => {
                sqlx::query("SELECT * FROM events ORDER BY created_at ASC, id ASC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(c) => {
                sqlx::query(
                    "SELECT * FROM events WHERE (created_at, id) > (?, ?) \
                     ORDER BY created_at ASC, id ASC LIMIT ?",
                )
                .bind(c.created_after.to_rfc3339())
                .bind(c.after_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(row_to_event).collect()
    }
}
