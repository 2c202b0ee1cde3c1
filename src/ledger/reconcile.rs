//! Client balance reconciliation. Totals are always recomputed from the
//! client's current fees and written back whole, never adjusted in place.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::model::{money, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, RecordKind};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClientTotals {
    pub total_due: Decimal,
    pub total_paid: Decimal,
}

impl ClientTotals {
    /// Everything billed to the client, due or paid
    pub fn billed(&self) -> Decimal {
        self.total_due + self.total_paid
    }
}

/// Aggregate fee amounts by stored status
pub fn compute_totals<'a>(fees: impl IntoIterator<Item = &'a Fee>) -> ClientTotals {
    let mut due = Decimal::ZERO;
    let mut paid = Decimal::ZERO;
    for fee in fees {
        if fee.status.is_outstanding() {
            due += fee.amount;
        } else {
            paid += fee.amount;
        }
    }
    ClientTotals {
        total_due: money::normalize(due),
        total_paid: money::normalize(paid),
    }
}

/// Recompute a client's totals from its fees and store them on the client.
///
/// One fee read, one client write. A missing client comes back as
/// [`LedgerError::NotFound`]; a rejected write as
/// [`LedgerError::WriteFailed`], in which case the computed totals are
/// dropped.
pub fn recompute_client_totals<S: RecordStore + ?Sized>(
    store: &S,
    client_id: ClientId,
) -> Result<ClientTotals> {
    let fees = store
        .list_fees(&FeeFilter::for_client(client_id))
        .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
    let totals = compute_totals(&fees);

    store
        .update_client(
            client_id,
            ClientPatch::totals(totals.total_due, totals.total_paid),
        )
        .map_err(|e| LedgerError::write(RecordKind::Client, e))?;

    debug!(
        client_id,
        fees = fees.len(),
        total_due = %totals.total_due,
        total_paid = %totals.total_paid,
        "recomputed client totals"
    );
    Ok(totals)
}

/// Recompute every client's totals, collecting each client's result.
///
/// Used to repair drift left behind by partial failures.
pub fn reconcile_all<S: RecordStore + ?Sized>(
    store: &S,
) -> Result<Vec<(ClientId, Result<ClientTotals>)>> {
    let clients = store
        .list_clients(&ClientFilter::default())
        .map_err(|e| LedgerError::read(RecordKind::Client, e))?;

    Ok(clients
        .iter()
        .map(|client| (client.id, recompute_client_totals(store, client.id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, FeeCategory, FeeStatus, NewClient};
    use crate::store::{MemoryStore, Operation, Tables};
    use chrono::NaiveDate;

    fn fee(id: u32, client_id: ClientId, cents: i64, status: FeeStatus) -> Fee {
        Fee {
            id,
            client_id,
            description: format!("fee {id}"),
            note: String::new(),
            amount: Decimal::new(cents, 2),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            category: FeeCategory::Consulting,
            is_recurring: false,
            status,
        }
    }

    fn store_with(fees: Vec<Fee>) -> (MemoryStore, ClientId) {
        let mut tables = Tables::default();
        let client: Client = tables.insert_client(NewClient {
            name: "Acme".to_string(),
            ..NewClient::default()
        });
        tables.fees = fees;
        (MemoryStore::with_tables(tables), client.id)
    }

    #[test]
    fn pending_and_overdue_are_due_paid_is_paid() {
        let fees = [
            fee(1, 1, 10000, FeeStatus::Pending),
            fee(2, 1, 2550, FeeStatus::Overdue),
            fee(3, 1, 5000, FeeStatus::Paid),
        ];
        let totals = compute_totals(&fees);
        assert_eq!(totals.total_due, Decimal::new(12550, 2));
        assert_eq!(totals.total_paid, Decimal::new(5000, 2));
    }

    #[test]
    fn due_plus_paid_equals_every_fee_amount() {
        let fees: Vec<Fee> = (1..=40)
            .map(|i| {
                let status = match i % 3 {
                    0 => FeeStatus::Pending,
                    1 => FeeStatus::Overdue,
                    _ => FeeStatus::Paid,
                };
                fee(i, 1, i64::from(i) * 111 + 1, status)
            })
            .collect();

        let totals = compute_totals(&fees);
        let sum: Decimal = fees.iter().map(|f| f.amount).sum();
        assert_eq!(totals.billed(), sum);
    }

    #[test]
    fn repeated_cents_do_not_drift() {
        let fees: Vec<Fee> = (1..=1000)
            .map(|i| fee(i, 1, 10, FeeStatus::Pending))
            .collect();
        assert_eq!(compute_totals(&fees).total_due, Decimal::new(10000, 2));
    }

    #[test]
    fn scenario_one_pending_one_paid() {
        let (store, client_id) = store_with(vec![
            fee(1, 1, 10000, FeeStatus::Pending),
            fee(2, 1, 5000, FeeStatus::Paid),
        ]);

        let totals = recompute_client_totals(&store, client_id).unwrap();
        assert_eq!(totals.total_due, Decimal::from(100));
        assert_eq!(totals.total_paid, Decimal::from(50));

        let client = store.get_client(client_id).unwrap();
        assert_eq!(client.total_due, Decimal::from(100));
        assert_eq!(client.total_paid, Decimal::from(50));
    }

    #[test]
    fn recompute_is_idempotent() {
        let (store, client_id) = store_with(vec![
            fee(1, 1, 1999, FeeStatus::Pending),
            fee(2, 1, 1, FeeStatus::Paid),
            fee(3, 2, 70000, FeeStatus::Pending),
        ]);

        let first = recompute_client_totals(&store, client_id).unwrap();
        let second = recompute_client_totals(&store, client_id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_due, Decimal::new(1999, 2));
    }

    #[test]
    fn overwrites_stale_totals() {
        let (store, client_id) = store_with(vec![fee(1, 1, 4200, FeeStatus::Pending)]);
        store
            .update_client(client_id, ClientPatch::totals(Decimal::from(999), Decimal::from(7)))
            .unwrap();

        recompute_client_totals(&store, client_id).unwrap();
        let client = store.get_client(client_id).unwrap();
        assert_eq!(client.total_due, Decimal::from(42));
        assert_eq!(client.total_paid, Decimal::ZERO);
    }

    #[test]
    fn missing_client_is_not_found() {
        let (store, _) = store_with(Vec::new());
        let err = recompute_client_totals(&store, 99).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn rejected_write_is_write_failed_and_fees_untouched() {
        let (store, client_id) = store_with(vec![fee(1, 1, 10000, FeeStatus::Pending)]);
        store.fail_on(RecordKind::Client, Operation::Update);

        let err = recompute_client_totals(&store, client_id).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WriteFailed {
                kind: RecordKind::Client,
                ..
            }
        ));
        assert_eq!(store.snapshot().fees[0].status, FeeStatus::Pending);
        assert_eq!(store.snapshot().clients[0].total_due, Decimal::ZERO);
    }

    #[test]
    fn reconcile_all_visits_every_client() {
        let mut tables = Tables::default();
        for name in ["Acme", "Globex"] {
            tables.insert_client(NewClient {
                name: name.to_string(),
                ..NewClient::default()
            });
        }
        tables.fees = vec![
            fee(1, 1, 1000, FeeStatus::Paid),
            fee(2, 2, 2000, FeeStatus::Pending),
        ];
        let store = MemoryStore::with_tables(tables);

        let results = reconcile_all(&store).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.clients[0].total_paid, Decimal::from(10));
        assert_eq!(snapshot.clients[1].total_due, Decimal::from(20));
    }
}
