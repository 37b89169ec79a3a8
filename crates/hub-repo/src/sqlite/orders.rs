//! `SqliteOrdersRepository`, grounded on `cowprotocol-services`'s
//! repository modules (plain `sqlx::query`, manual row decode, explicit
//! transactions for multi-statement writes).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_types::{
    validate_distinct_chains, AddSignaturesOutcome, Amount, ChainId, NewOrder, Order, OrderFilter,
    OrderPatch, OrderSignature, OrderStatus, Page,
};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::RepoError;
use crate::traits::OrdersRepository;

pub struct SqliteOrdersRepository {
    pool: SqlitePool,
}

impl SqliteOrdersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::InProgress => "in-progress",
        OrderStatus::ReadyForRelay => "ready-for-relay",
        OrderStatus::Relayed => "relayed",
        OrderStatus::Failed => "failed",
        OrderStatus::Finalized => "finalized",
    }
}

fn status_from_str(s: &str) -> Result<OrderStatus, RepoError> {
    Ok(match s {
        "pending" => OrderStatus::Pending,
        "in-progress" => OrderStatus::InProgress,
        "ready-for-relay" => OrderStatus::ReadyForRelay,
        "relayed" => OrderStatus::Relayed,
        "failed" => OrderStatus::Failed,
        "finalized" => OrderStatus::Finalized,
        other => return Err(RepoError::Decode(format!("unknown order status: {other}"))),
    })
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepoError> {
    let amount: String = row.try_get("amount")?;
    let relayer_fee: String = row.try_get("relayer_fee")?;
    let source: String = row.try_get("source")?;
    let dest: String = row.try_get("dest")?;
    let status: String = row.try_get("status")?;
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Order {
        id: Uuid::parse_str(&id).map_err(|e| RepoError::Decode(e.to_string()))?,
        source: ChainId::from_str(&source).map_err(|e| RepoError::Decode(e.to_string()))?,
        dest: ChainId::from_str(&dest).map_err(|e| RepoError::Decode(e.to_string()))?,
        from: row.try_get("from_addr")?,
        to: row.try_get("to_addr")?,
        amount: Amount::from_str(&amount).map_err(|e| RepoError::Decode(e.to_string()))?,
        relayer_fee: Amount::from_str(&relayer_fee)
            .map_err(|e| RepoError::Decode(e.to_string()))?,
        origin_trx_hash: row.try_get("origin_trx_hash")?,
        destination_trx_hash: row.try_get("destination_trx_hash")?,
        source_nonce: row.try_get("source_nonce")?,
        source_payload: row.try_get("source_payload")?,
        failure_reason_public: row.try_get("failure_reason_public")?,
        oracle_accept_to_relay: row.try_get::<i64, _>("oracle_accept_to_relay")? != 0,
        status: status_from_str(&status)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| RepoError::Decode(e.to_string()))?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| RepoError::Decode(e.to_string()))?
            .with_timezone(&Utc),
    })
}

fn derive_source_nonce(origin_trx_hash: &str) -> String {
    origin_trx_hash.to_string()
}

fn derive_source_payload(order_id: Uuid) -> String {
    order_id.to_string()
}

#[async_trait]
impl OrdersRepository for SqliteOrdersRepository {
    async fn paginate(&self, filter: &OrderFilter) -> Result<Page<Order>, RepoError> {
        let mut sql = String::from("SELECT * FROM orders WHERE 1=1");
        if filter.source.is_some() {
            sql.push_str(" AND source = ?");
        }
        if filter.dest.is_some() {
            sql.push_str(" AND dest = ?");
        }
        if filter.from.is_some() {
            sql.push_str(" AND from_addr = ?");
        }
        if filter.to.is_some() {
            sql.push_str(" AND to_addr = ?");
        }
        if filter.id.is_some() {
            sql.push_str(" AND id = ?");
        }
        sql.push_str(if filter.order_desc {
            " ORDER BY created_at DESC"
        } else {
            " ORDER BY created_at ASC"
        });

        let mut query = sqlx::query(&sql);
        if let Some(source) = filter.source {
            query = query.bind(source.as_str());
        }
        if let Some(dest) = filter.dest {
            query = query.bind(dest.as_str());
        }
        if let Some(from) = &filter.from {
            query = query.bind(from);
        }
        if let Some(to) = &filter.to {
            query = query.bind(to);
        }
        if let Some(id) = filter.id {
            query = query.bind(id.to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;
        let mut all: Vec<Order> = rows.iter().map(row_to_order).collect::<Result<_, _>>()?;

        // Range/status filters that don't map cleanly onto bind placeholders
        // above (amount comparisons need BigUint semantics, not lexical TEXT
        // comparison) are applied in-process, same as the in-memory backend.
        if let Some(statuses) = &filter.status {
            all.retain(|o| statuses.contains(&o.status));
        }
        if let Some(min) = &filter.amount_min {
            all.retain(|o| o.amount.as_biguint() >= min.as_biguint());
        }
        if let Some(max) = &filter.amount_max {
            all.retain(|o| o.amount.as_biguint() <= max.as_biguint());
        }
        if let Some(after) = filter.created_after {
            all.retain(|o| o.created_at > after);
        }
        if let Some(before) = filter.created_before {
            all.retain(|o| o.created_at < before);
        }

        let total = all.len() as u64;
        let limit = filter.limit.max(1) as usize;
        let offset = (filter.page.saturating_sub(1)) as usize * limit;
        let data = all.into_iter().skip(offset).take(limit).collect();
        Ok(Page { data, total })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn find_by_origin_trx_hash(&self, hash: &str) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query("SELECT * FROM orders WHERE origin_trx_hash = ?")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn create(&self, new: NewOrder) -> Result<Order, RepoError> {
        validate_distinct_chains(new.source, new.dest)?;

        let now = Utc::now();
        let source_nonce = new
            .source_nonce
            .unwrap_or_else(|| derive_source_nonce(&new.origin_trx_hash));
        let source_payload = new
            .source_payload
            .unwrap_or_else(|| derive_source_payload(new.id));

        sqlx::query(
            "INSERT INTO orders (id, source, dest, from_addr, to_addr, amount, relayer_fee, \
             origin_trx_hash, destination_trx_hash, source_nonce, source_payload, \
             failure_reason_public, oracle_accept_to_relay, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.id.to_string())
        .bind(new.source.as_str())
        .bind(new.dest.as_str())
        .bind(&new.from)
        .bind(&new.to)
        .bind(new.amount.to_string())
        .bind(new.relayer_fee.to_string())
        .bind(&new.origin_trx_hash)
        .bind(&new.destination_trx_hash)
        .bind(&source_nonce)
        .bind(&source_payload)
        .bind(None::<String>)
        .bind(new.oracle_accept_to_relay as i64)
        .bind(status_to_str(new.status))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_by_id(new.id)
            .await?
            .ok_or(RepoError::OrderNotFound(new.id))
    }

    async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>, RepoError> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let status = patch.status.unwrap_or(existing.status);
        let destination_trx_hash = patch
            .destination_trx_hash
            .or(existing.destination_trx_hash);
        let oracle_accept_to_relay = patch
            .oracle_accept_to_relay
            .unwrap_or(existing.oracle_accept_to_relay);
        let failure_reason_public = patch
            .failure_reason_public
            .or(existing.failure_reason_public);

        sqlx::query(
            "UPDATE orders SET status = ?, destination_trx_hash = ?, oracle_accept_to_relay = ?, \
             failure_reason_public = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status_to_str(status))
        .bind(&destination_trx_hash)
        .bind(oracle_accept_to_relay as i64)
        .bind(&failure_reason_public)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM order_signatures WHERE order_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_active_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError> {
        let rows = sqlx::query(
            "SELECT id FROM orders WHERE status IN ('pending', 'in-progress') \
             ORDER BY created_at ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                Uuid::parse_str(&id).map_err(|e| RepoError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn find_relayable_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError> {
        let rows = sqlx::query(
            "SELECT id FROM orders WHERE status = 'ready-for-relay' ORDER BY created_at ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                Uuid::parse_str(&id).map_err(|e| RepoError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn add_signatures(
        &self,
        order_id: Uuid,
        sigs: Vec<OrderSignature>,
    ) -> Result<AddSignaturesOutcome, RepoError> {
        if self.find_by_id(order_id).await?.is_none() {
            return Err(RepoError::OrderNotFound(order_id));
        }

        let before = self.count_signatures(order_id).await?;

        let mut dedup = std::collections::HashSet::new();
        let mut tx = self.pool.begin().await?;
        for sig in &sigs {
            if sig.order_id != order_id || !dedup.insert(sig.signature.clone()) {
                continue;
            }
            sqlx::query(
                "INSERT INTO order_signatures (order_id, signature) VALUES (?, ?) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(order_id.to_string())
            .bind(&sig.signature)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let after = self.count_signatures(order_id).await?;
        Ok(AddSignaturesOutcome {
            added: after.saturating_sub(before),
            total: after,
        })
    }

    async fn find_by_ids_with_signatures(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<(Order, Vec<OrderSignature>)>, RepoError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(order) = self.find_by_id(*id).await? else {
                continue;
            };
            let rows = sqlx::query("SELECT signature FROM order_signatures WHERE order_id = ?")
                .bind(id.to_string())
                .fetch_all(&self.pool)
                .await?;
            let sigs = rows
                .into_iter()
                .map(|row| {
                    Ok(OrderSignature {
                        order_id: *id,
                        signature: row.try_get("signature")?,
                    })
                })
                .collect::<Result<Vec<_>, RepoError>>()?;
            out.push((order, sigs));
        }
        Ok(out)
    }
}

impl SqliteOrdersRepository {
    async fn count_signatures(&self, order_id: Uuid) -> Result<u64, RepoError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM order_signatures WHERE order_id = ?")
            .bind(order_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}
