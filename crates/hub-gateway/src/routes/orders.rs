//! `/api/orders*` (spec.md §6).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use hub_oracle::compute_required_signatures;
use hub_types::{Amount, ChainId, Order, OrderFilter, OrderStatus, Page, StoredEvent};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::GatewayState;

#[derive(Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Serialize)]
pub struct OrdersResponse {
    pub data: Vec<Order>,
    pub pagination: Pagination,
}

fn parse_chain(raw: &str) -> Result<ChainId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid chain id: {raw}")))
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    match raw {
        "pending" => Ok(OrderStatus::Pending),
        "in-progress" => Ok(OrderStatus::InProgress),
        "ready-for-relay" => Ok(OrderStatus::ReadyForRelay),
        "relayed" => Ok(OrderStatus::Relayed),
        "failed" => Ok(OrderStatus::Failed),
        "finalized" => Ok(OrderStatus::Finalized),
        other => Err(AppError::BadRequest(format!("invalid order status: {other}"))),
    }
}

fn parse_amount(raw: &str, field: &str) -> Result<Amount, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {field}: not a decimal amount")))
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::BadRequest(format!("invalid {field}: not an RFC3339 timestamp")))
}

fn parse_order_filter(params: &HashMap<String, String>) -> Result<OrderFilter, AppError> {
    let page = match params.get("page") {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest("invalid page".to_string()))?,
        None => 1,
    };
    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest("invalid limit".to_string()))?,
        None => 50,
    };
    let order_desc = match params.get("order").map(String::as_str) {
        Some("desc") | None => true,
        Some("asc") => false,
        Some(other) => return Err(AppError::BadRequest(format!("invalid order: {other}"))),
    };
    let status = match params.get("status") {
        Some(raw) => {
            let statuses = raw
                .split(',')
                .map(parse_status)
                .collect::<Result<Vec<_>, _>>()?;
            Some(statuses)
        }
        None => None,
    };

    Ok(OrderFilter {
        page,
        limit,
        order_desc,
        source: params.get("source").map(|s| parse_chain(s)).transpose()?,
        dest: params.get("dest").map(|s| parse_chain(s)).transpose()?,
        status,
        from: params.get("from").cloned(),
        to: params.get("to").cloned(),
        amount_min: params
            .get("amount_min")
            .map(|s| parse_amount(s, "amount_min"))
            .transpose()?,
        amount_max: params
            .get("amount_max")
            .map(|s| parse_amount(s, "amount_max"))
            .transpose()?,
        created_after: params
            .get("created_after")
            .map(|s| parse_timestamp(s, "created_after"))
            .transpose()?,
        created_before: params
            .get("created_before")
            .map(|s| parse_timestamp(s, "created_before"))
            .transpose()?,
        id: params
            .get("id")
            .map(|s| {
                s.parse::<Uuid>()
                    .map_err(|_| AppError::BadRequest("invalid id".to_string()))
            })
            .transpose()?,
    })
}

pub async fn list_orders(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<OrdersResponse>, AppError> {
    let filter = parse_order_filter(&params)?;
    let page = filter.page;
    let limit = filter.limit;
    let Page { data, total } = state.orders.paginate(&filter).await?;
    Ok(Json(OrdersResponse {
        data,
        pagination: Pagination { page, limit, total },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSignaturesDto {
    pub order_id: Uuid,
    pub signatures: Vec<String>,
}

#[derive(Serialize)]
pub struct OrderSignaturesResponse {
    pub data: Vec<OrderSignaturesDto>,
}

/// Relayable orders whose signature count has reached quorum.
pub async fn signatures(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<OrderSignaturesResponse>, AppError> {
    let required = compute_required_signatures(state.signature_threshold, state.oracle_count);
    let ids = state.orders.find_relayable_ids(500).await?;
    let rows = state.orders.find_by_ids_with_signatures(&ids).await?;
    let data = rows
        .into_iter()
        .filter(|(_, sigs)| sigs.len() as u64 >= required)
        .map(|(order, sigs)| OrderSignaturesDto {
            order_id: order.id,
            signatures: sigs.into_iter().map(|s| s.signature).collect(),
        })
        .collect();
    Ok(Json(OrderSignaturesResponse { data }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCursorDto {
    pub created_at: DateTime<Utc>,
    pub id: i64,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub data: Vec<StoredEvent>,
    pub cursor: Option<EventCursorDto>,
}

pub async fn events(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<EventsResponse>, AppError> {
    let created_after = params
        .get("created_after")
        .map(|s| parse_timestamp(s, "created_after"))
        .transpose()?;
    let after_id = params
        .get("after_id")
        .map(|s| s.parse::<i64>().map_err(|_| AppError::BadRequest("invalid after_id".to_string())))
        .transpose()?;
    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest("invalid limit".to_string()))?,
        None => 100,
    };

    let cursor = match (created_after, after_id) {
        (Some(created_after), Some(after_id)) => Some(hub_types::EventCursor { created_after, after_id }),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "created_after and after_id must be supplied together".to_string(),
            ))
        }
    };

    let rows = state.events.list_after_created_at(cursor, limit).await?;
    let next_cursor = rows.last().map(|e| EventCursorDto { created_at: e.created_at, id: e.id });
    Ok(Json(EventsResponse { data: rows, cursor: next_cursor }))
}

#[derive(Serialize)]
pub struct OrderByHashResponse {
    pub data: Order,
}

pub async fn by_trx_hash(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<OrderByHashResponse>, AppError> {
    let hash = params
        .get("hash")
        .ok_or_else(|| AppError::BadRequest("missing hash query param".to_string()))?;
    let order = state
        .orders
        .find_by_origin_trx_hash(hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order with trx hash {hash} not found")))?;
    Ok(Json(OrderByHashResponse { data: order }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::sample_state;
    use axum::response::IntoResponse;
    use hub_types::{NewOrder, OrderSignature};

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

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parse_order_filter_rejects_an_unknown_status() {
        let err = parse_order_filter(&params(&[("status", "bogus")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn parse_order_filter_defaults_page_limit_and_order() {
        let filter = parse_order_filter(&HashMap::new()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 50);
        assert!(filter.order_desc);
    }

    #[tokio::test]
    async fn list_orders_reports_total_and_empty_data_for_a_fresh_repository() {
        let state = sample_state();
        let Json(body) = list_orders(State(state), Query(HashMap::new())).await.unwrap();
        assert_eq!(body.pagination.total, 0);
        assert!(body.data.is_empty());
    }

    #[tokio::test]
    async fn signatures_excludes_orders_below_quorum() {
        let state = sample_state();
        let id = Uuid::new_v4();
        let mut new_order = sample_new_order(id);
        new_order.status = OrderStatus::ReadyForRelay;
        state.orders.create(new_order).await.unwrap();
        state
            .orders
            .add_signatures(id, vec![OrderSignature { order_id: id, signature: "sig1".into() }])
            .await
            .unwrap();

        // signature_threshold=0.67, oracle_count=3 -> requires ceil(0.67*3)=3 sigs.
        let Json(body) = signatures(State(state)).await.unwrap();
        assert!(body.data.is_empty());
    }

    #[tokio::test]
    async fn events_requires_created_after_and_after_id_together() {
        let state = sample_state();
        let err = events(State(state), Query(params(&[("created_after", "2026-01-01T00:00:00Z")])))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn by_trx_hash_404s_when_not_found() {
        let state = sample_state();
        let err = by_trx_hash(State(state), Query(params(&[("hash", "missing")])))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), axum::http::StatusCode::NOT_FOUND);
    }
}
