//! Repository contracts (C4, C5), grounded on `ioi-api::storage::NodeStore`'s
//! `#[async_trait]` + `thiserror` shape.

use async_trait::async_trait;
use hub_types::{NewOrder, Order, OrderFilter, OrderPatch, OrderSignature, Page};
use hub_types::{EventCursor, NewEvent, StoredEvent};
use uuid::Uuid;

use crate::error::RepoError;

#[async_trait]
pub trait OrdersRepository: Send + Sync {
    async fn paginate(&self, filter: &OrderFilter) -> Result<Page<Order>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepoError>;

    async fn find_by_origin_trx_hash(&self, hash: &str) -> Result<Option<Order>, RepoError>;

    /// Inserts `order`, deriving `source_nonce`/`source_payload` when omitted.
    async fn create(&self, order: NewOrder) -> Result<Order, RepoError>;

    /// Returns `None` if `id` does not exist.
    async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Ids with status in {pending, in-progress}.
    async fn find_active_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError>;

    /// Ids with status = ready-for-relay.
    async fn find_relayable_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError>;

    /// Deduplicates `sigs` against each other and against existing rows,
    /// inserts the remainder atomically, and returns the resulting counts.
    async fn add_signatures(
        &self,
        order_id: Uuid,
        sigs: Vec<OrderSignature>,
    ) -> Result<hub_types::AddSignaturesOutcome, RepoError>;

    async fn find_by_ids_with_signatures(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<(Order, Vec<OrderSignature>)>, RepoError>;
}

#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Inserts `event` if `(signature, type, nonce)` is unseen; returns
    /// `None` on duplicate.
    async fn create(&self, event: NewEvent) -> Result<Option<StoredEvent>, RepoError>;

    /// Set-intersection of `sigs` against signatures already stored, across
    /// all event types. A cheap pre-decode pre-filter only — `create`'s
    /// `(signature, type, nonce)` uniqueness check is the actual dedup guard.
    async fn find_existing_signatures(&self, sigs: &[String]) -> Result<Vec<String>, RepoError>;

    /// Cursor paging ordered by `(created_at, id)` ascending, strictly
    /// greater than `cursor`.
    async fn list_after_created_at(
        &self,
        cursor: Option<EventCursor>,
        limit: u32,
    ) -> Result<Vec<StoredEvent>, RepoError>;
}
