//! `RwLock<HashMap<..>>`-backed implementations used by every unit and
//! integration test, and available to embedders who don't want sqlite.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use hub_types::{
    validate_distinct_chains, AddSignaturesOutcome, EventCursor, EventType, NewEvent, NewOrder,
    Order, OrderFilter, OrderPatch, OrderSignature, OrderStatus, Page, StoredEvent,
};
use uuid::Uuid;

use crate::error::RepoError;
use crate::traits::{EventsRepository, OrdersRepository};

#[derive(Default)]
struct OrdersState {
    orders: HashMap<Uuid, Order>,
    signatures: HashMap<Uuid, Vec<String>>,
    insertion_order: Vec<Uuid>,
}

pub struct InMemoryOrdersRepository {
    state: RwLock<OrdersState>,
}

impl InMemoryOrdersRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(OrdersState::default()),
        }
    }
}

impl Default for InMemoryOrdersRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrdersRepository for InMemoryOrdersRepository {
    async fn paginate(&self, filter: &OrderFilter) -> Result<Page<Order>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut matches: Vec<Order> = state
            .insertion_order
            .iter()
            .filter_map(|id| state.orders.get(id))
            .filter(|o| filter.source.map_or(true, |s| s == o.source))
            .filter(|o| filter.dest.map_or(true, |d| d == o.dest))
            .filter(|o| {
                filter
                    .status
                    .as_ref()
                    .map_or(true, |statuses| statuses.contains(&o.status))
            })
            .filter(|o| filter.from.as_deref().map_or(true, |f| f == o.from))
            .filter(|o| filter.to.as_deref().map_or(true, |t| t == o.to))
            .filter(|o| {
                filter
                    .amount_min
                    .as_ref()
                    .map_or(true, |min| o.amount.as_biguint() >= min.as_biguint())
            })
            .filter(|o| {
                filter
                    .amount_max
                    .as_ref()
                    .map_or(true, |max| o.amount.as_biguint() <= max.as_biguint())
            })
            .filter(|o| {
                filter
                    .created_after
                    .map_or(true, |after| o.created_at > after)
            })
            .filter(|o| {
                filter
                    .created_before
                    .map_or(true, |before| o.created_at < before)
            })
            .filter(|o| filter.id.map_or(true, |id| id == o.id))
            .cloned()
            .collect();

        if filter.order_desc {
            matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }

        let total = matches.len() as u64;
        let limit = filter.limit.max(1) as usize;
        let offset = (filter.page.saturating_sub(1)) as usize * limit;
        let data = matches.into_iter().skip(offset).take(limit).collect();
        Ok(Page { data, total })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(state.orders.get(&id).cloned())
    }

    async fn find_by_origin_trx_hash(&self, hash: &str) -> Result<Option<Order>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(state
            .orders
            .values()
            .find(|o| o.origin_trx_hash == hash)
            .cloned())
    }

    async fn create(&self, new: NewOrder) -> Result<Order, RepoError> {
        validate_distinct_chains(new.source, new.dest)?;

        let now = Utc::now();
        let order = Order {
            id: new.id,
            source: new.source,
            dest: new.dest,
            from: new.from,
            to: new.to,
            amount: new.amount,
            relayer_fee: new.relayer_fee,
            origin_trx_hash: new.origin_trx_hash.clone(),
            destination_trx_hash: new.destination_trx_hash,
            source_nonce: new
                .source_nonce
                .unwrap_or_else(|| derive_source_nonce(&new.origin_trx_hash)),
            source_payload: new
                .source_payload
                .unwrap_or_else(|| derive_source_payload(new.id)),
            failure_reason_public: None,
            oracle_accept_to_relay: new.oracle_accept_to_relay,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.insertion_order.push(order.id);
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>, RepoError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(hash) = patch.destination_trx_hash {
            order.destination_trx_hash = Some(hash);
        }
        if let Some(accept) = patch.oracle_accept_to_relay {
            order.oracle_accept_to_relay = accept;
        }
        if let Some(reason) = patch.failure_reason_public {
            order.failure_reason_public = Some(reason);
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.orders.remove(&id);
        state.signatures.remove(&id);
        state.insertion_order.retain(|existing| *existing != id);
        Ok(())
    }

    async fn find_active_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(state
            .insertion_order
            .iter()
            .filter(|id| {
                matches!(
                    state.orders.get(id).map(|o| o.status),
                    Some(OrderStatus::Pending) | Some(OrderStatus::InProgress)
                )
            })
            .take(limit as usize)
            .copied()
            .collect())
    }

    async fn find_relayable_ids(&self, limit: u32) -> Result<Vec<Uuid>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(state
            .insertion_order
            .iter()
            .filter(|id| {
                matches!(
                    state.orders.get(id).map(|o| o.status),
                    Some(OrderStatus::ReadyForRelay)
                )
            })
            .take(limit as usize)
            .copied()
            .collect())
    }

    async fn add_signatures(
        &self,
        order_id: Uuid,
        sigs: Vec<OrderSignature>,
    ) -> Result<AddSignaturesOutcome, RepoError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !state.orders.contains_key(&order_id) {
            return Err(RepoError::OrderNotFound(order_id));
        }

        let mut dedup_input = HashSet::new();
        let existing = state.signatures.entry(order_id).or_default();
        let existing_set: HashSet<String> = existing.iter().cloned().collect();

        let mut added = 0u64;
        for sig in sigs {
            if sig.order_id != order_id {
                continue;
            }
            if !dedup_input.insert(sig.signature.clone()) {
                continue;
            }
            if existing_set.contains(&sig.signature) {
                continue;
            }
            existing.push(sig.signature);
            added += 1;
        }

        Ok(AddSignaturesOutcome {
            added,
            total: existing.len() as u64,
        })
    }

    async fn find_by_ids_with_signatures(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<(Order, Vec<OrderSignature>)>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(ids
            .iter()
            .filter_map(|id| {
                let order = state.orders.get(id)?;
                let sigs = state
                    .signatures
                    .get(id)
                    .map(|list| {
                        list.iter()
                            .map(|signature| OrderSignature {
                                order_id: *id,
                                signature: signature.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some((order.clone(), sigs))
            })
            .collect())
    }
}

fn derive_source_nonce(origin_trx_hash: &str) -> String {
    origin_trx_hash.to_string()
}

fn derive_source_payload(order_id: Uuid) -> String {
    order_id.to_string()
}

#[derive(Default)]
struct EventsState {
    events: Vec<StoredEvent>,
    seen: HashSet<(String, EventType, String)>,
    next_id: i64,
}

pub struct InMemoryEventsRepository {
    state: RwLock<EventsState>,
}

impl InMemoryEventsRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EventsState::default()),
        }
    }
}

impl Default for InMemoryEventsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventsRepository for InMemoryEventsRepository {
    async fn create(&self, event: NewEvent) -> Result<Option<StoredEvent>, RepoError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = (event.signature.clone(), event.event_type, event.nonce.clone());
        if !state.seen.insert(key) {
            return Ok(None);
        }

        state.next_id += 1;
        let stored = StoredEvent {
            id: state.next_id,
            signature: event.signature,
            slot: event.slot,
            chain: event.chain,
            event_type: event.event_type,
            nonce: event.nonce,
            payload: event.payload,
            created_at: Utc::now(),
        };
        state.events.push(stored.clone());
        Ok(Some(stored))
    }

    async fn find_existing_signatures(&self, sigs: &[String]) -> Result<Vec<String>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stored: HashSet<&str> = state.events.iter().map(|e| e.signature.as_str()).collect();
        Ok(sigs
            .iter()
            .filter(|s| stored.contains(s.as_str()))
            .cloned()
            .collect())
    }

    async fn list_after_created_at(
        &self,
        cursor: Option<EventCursor>,
        limit: u32,
    ) -> Result<Vec<StoredEvent>, RepoError> {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut matches: Vec<StoredEvent> = state
            .events
            .iter()
            .filter(|e| match cursor {
                None => true,
                Some(c) => (e.created_at, e.id) > (c.created_after, c.after_id),
            })
            .cloned()
            .collect();
        matches.sort_by_key(|e| (e.created_at, e.id));
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_types::{Amount, ChainId};

    fn sample_new_order(id: Uuid) -> NewOrder {
        NewOrder {
            id,
            source: ChainId::ChainS,
            dest: ChainId::ChainQ,
            from: "alice".into(),
            to: "bob".into(),
            amount: Amount::from_u64(100),
            relayer_fee: Amount::from_u64(1),
            origin_trx_hash: format!("hash-{id}"),
            destination_trx_hash: None,
            source_nonce: None,
            source_payload: None,
            oracle_accept_to_relay: true,
            status: OrderStatus::Pending,
        }
    }

    #[tokio::test]
    async fn create_rejects_orders_with_equal_source_and_dest() {
        let repo = InMemoryOrdersRepository::new();
        let mut order = sample_new_order(Uuid::new_v4());
        order.dest = order.source;
        let result = repo.create(order).await;
        assert!(matches!(result, Err(RepoError::SameChain(_))));
    }

    #[tokio::test]
    async fn create_then_find_by_id_round_trips() {
        let repo = InMemoryOrdersRepository::new();
        let id = Uuid::new_v4();
        let created = repo.create(sample_new_order(id)).await.unwrap();
        assert_eq!(created.id, id);
        assert!(!created.source_nonce.is_empty());

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn add_signatures_deduplicates_across_calls_and_within_a_batch() {
        let repo = InMemoryOrdersRepository::new();
        let id = Uuid::new_v4();
        repo.create(sample_new_order(id)).await.unwrap();

        let sigs = vec![
            OrderSignature {
                order_id: id,
                signature: "sigA".into(),
            },
            OrderSignature {
                order_id: id,
                signature: "sigA".into(),
            },
            OrderSignature {
                order_id: id,
                signature: "sigB".into(),
            },
        ];
        let outcome = repo.add_signatures(id, sigs).await.unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.total, 2);

        let more = vec![OrderSignature {
            order_id: id,
            signature: "sigB".into(),
        }];
        let outcome2 = repo.add_signatures(id, more).await.unwrap();
        assert_eq!(outcome2.added, 0);
        assert_eq!(outcome2.total, 2);
    }

    #[tokio::test]
    async fn update_on_missing_order_returns_none() {
        let repo = InMemoryOrdersRepository::new();
        let result = repo
            .update(Uuid::new_v4(), OrderPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn events_create_rejects_duplicate_signature_type_nonce() {
        let repo = InMemoryEventsRepository::new();
        let event = NewEvent {
            signature: "sig1".into(),
            slot: Some(10),
            chain: ChainId::ChainS,
            event_type: EventType::Outbound,
            nonce: "a".repeat(64),
            payload: serde_json::json!({}),
        };
        let first = repo.create(event.clone()).await.unwrap();
        assert!(first.is_some());
        let second = repo.create(event).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn list_after_created_at_paginates_by_cursor() {
        let repo = InMemoryEventsRepository::new();
        for i in 0..3 {
            repo.create(NewEvent {
                signature: format!("sig{i}"),
                slot: None,
                chain: ChainId::ChainQ,
                event_type: EventType::Lock,
                nonce: format!("{i:0>64}"),
                payload: serde_json::json!({}),
            })
            .await
            .unwrap();
        }
        let page = repo.list_after_created_at(None, 2).await.unwrap();
        assert_eq!(page.len(), 2);
    }
}
