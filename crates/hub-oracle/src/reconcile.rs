//! Order Reconciliator (C7, spec §4.7). Pure — no I/O, no clock reads —
//! so it's unit-testable in isolation (spec §8 properties 1-2).

use std::collections::HashMap;

use hub_types::OrderStatus;
use uuid::Uuid;

use crate::error::ReconcileError;
use crate::wire::OrderWithSignature;

/// Reconciles a non-empty group of reports for the same order id into a
/// single consensus report.
///
/// `reports` being empty is a programmer error (callers group by id from a
/// non-empty input, so a group can never be empty) and panics rather than
/// returning an error, matching `hub_scheduler::Poller::new`'s own
/// fail-loudly convention for invariants a caller controls.
pub fn reconcile(
    order_id: Uuid,
    reports: &[OrderWithSignature],
) -> Result<OrderWithSignature, ReconcileError> {
    assert!(!reports.is_empty(), "reconcile called with an empty group for {order_id}");

    let first = &reports[0];
    for report in &reports[1..] {
        check_field(order_id, "source", first.source == report.source)?;
        check_field(order_id, "dest", first.dest == report.dest)?;
        check_field(order_id, "from", first.from == report.from)?;
        check_field(order_id, "to", first.to == report.to)?;
        check_field(order_id, "amount", first.amount == report.amount)?;
        check_field(order_id, "relayer_fee", first.relayer_fee == report.relayer_fee)?;
        check_field(
            order_id,
            "origin_trx_hash",
            first.origin_trx_hash == report.origin_trx_hash,
        )?;
        check_field(
            order_id,
            "oracle_accept_to_relay",
            first.oracle_accept_to_relay == report.oracle_accept_to_relay,
        )?;
    }

    let status = elect_status(order_id, reports)?;
    let destination_trx_hash = elect_destination_trx_hash(reports);

    let mut consensus = first.clone();
    consensus.status = status;
    consensus.destination_trx_hash = destination_trx_hash;
    Ok(consensus)
}

fn check_field(order_id: Uuid, field: &'static str, equal: bool) -> Result<(), ReconcileError> {
    if equal {
        Ok(())
    } else {
        Err(ReconcileError::Mismatch { order_id, field })
    }
}

/// Plurality vote; a strict tie for the top spot is `NoConsensus`.
fn elect_status(
    order_id: Uuid,
    reports: &[OrderWithSignature],
) -> Result<OrderStatus, ReconcileError> {
    let mut counts: HashMap<OrderStatus, u32> = HashMap::new();
    for report in reports {
        *counts.entry(report.status).or_insert(0) += 1;
    }

    let max = *counts.values().max().unwrap_or(&0);
    let leaders: Vec<OrderStatus> = counts
        .into_iter()
        .filter(|(_, count)| *count == max)
        .map(|(status, _)| status)
        .collect();

    if leaders.len() == 1 {
        Ok(leaders[0])
    } else {
        Err(ReconcileError::NoConsensus { order_id })
    }
}

/// Plurality of non-empty values; ties broken in first-seen order. Absent
/// if no report carries a non-empty value.
fn elect_destination_trx_hash(reports: &[OrderWithSignature]) -> Option<String> {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u32> = HashMap::new();

    for report in reports {
        if let Some(hash) = report.destination_trx_hash.as_deref().filter(|h| !h.is_empty()) {
            if !counts.contains_key(hash) {
                first_seen.push(hash);
            }
            *counts.entry(hash).or_insert(0) += 1;
        }
    }

    let max = counts.values().copied().max()?;
    first_seen
        .into_iter()
        .find(|hash| counts[hash] == max)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_types::{Amount, ChainId};

    fn base_report(id: Uuid, status: OrderStatus, signature: &str) -> OrderWithSignature {
        OrderWithSignature {
            id,
            source: ChainId::ChainS,
            dest: ChainId::ChainQ,
            from: "alice".into(),
            to: "bob".into(),
            amount: Amount::from_u64(100),
            relayer_fee: Amount::from_u64(1),
            origin_trx_hash: "hash".into(),
            destination_trx_hash: None,
            oracle_accept_to_relay: true,
            status,
            signature: signature.into(),
        }
    }

    #[test]
    fn identical_reports_reconcile_to_any_one_of_them_regardless_of_order() {
        let id = Uuid::new_v4();
        let mut reports = vec![
            base_report(id, OrderStatus::Pending, "sig-a"),
            base_report(id, OrderStatus::Pending, "sig-b"),
            base_report(id, OrderStatus::Pending, "sig-c"),
        ];
        let forward = reconcile(id, &reports).unwrap();
        reports.reverse();
        let backward = reconcile(id, &reports).unwrap();
        assert_eq!(forward.status, backward.status);
        assert_eq!(forward.status, OrderStatus::Pending);
    }

    #[test]
    fn mismatched_non_status_field_fails_with_no_partial_result() {
        let id = Uuid::new_v4();
        let mut other = base_report(id, OrderStatus::Pending, "sig-b");
        other.to = "mallory".into();
        let reports = vec![base_report(id, OrderStatus::Pending, "sig-a"), other];
        let err = reconcile(id, &reports).unwrap_err();
        assert!(matches!(err, ReconcileError::Mismatch { field: "to", .. }));
    }

    #[test]
    fn strict_status_tie_fails_with_no_consensus() {
        let id = Uuid::new_v4();
        let reports = vec![
            base_report(id, OrderStatus::Pending, "sig-a"),
            base_report(id, OrderStatus::InProgress, "sig-b"),
        ];
        let err = reconcile(id, &reports).unwrap_err();
        assert!(matches!(err, ReconcileError::NoConsensus { .. }));
    }

    #[test]
    fn destination_trx_hash_elected_by_plurality_with_first_seen_tiebreak() {
        let id = Uuid::new_v4();
        let mut a = base_report(id, OrderStatus::Relayed, "sig-a");
        a.destination_trx_hash = Some("hashX".into());
        let mut b = base_report(id, OrderStatus::Relayed, "sig-b");
        b.destination_trx_hash = Some("hashY".into());
        let mut c = base_report(id, OrderStatus::Relayed, "sig-c");
        c.destination_trx_hash = Some("hashX".into());
        let reports = vec![a, b, c];
        let consensus = reconcile(id, &reports).unwrap();
        assert_eq!(consensus.destination_trx_hash.as_deref(), Some("hashX"));
    }

    #[test]
    fn destination_trx_hash_absent_when_no_report_has_one() {
        let id = Uuid::new_v4();
        let reports = vec![
            base_report(id, OrderStatus::Pending, "sig-a"),
            base_report(id, OrderStatus::Pending, "sig-b"),
        ];
        let consensus = reconcile(id, &reports).unwrap();
        assert!(consensus.destination_trx_hash.is_none());
    }
}
