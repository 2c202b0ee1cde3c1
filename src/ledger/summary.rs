use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::status::derive_effective_status;
use crate::model::{money, Client, ClientStatus, Fee, FeeStatus, Payment};

const RECENT_PAYMENTS: usize = 3;
const OLDEST_OVERDUE: usize = 2;

/// Dashboard figures across the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub as_of: NaiveDate,
    pub total_collected: Decimal,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub total_clients: usize,
    pub active_clients: usize,
    /// Most recent payments first
    pub recent_payments: Vec<Payment>,
    /// Overdue fees with the earliest due dates
    pub oldest_overdue: Vec<Fee>,
}

/// Build dashboard figures. Fee statuses are re-derived for `as_of`, so
/// stored `pending` fees past their due date count as overdue.
pub fn summarize(
    clients: &[Client],
    fees: &[Fee],
    payments: &[Payment],
    as_of: NaiveDate,
) -> LedgerSummary {
    let total_collected: Decimal = payments.iter().map(|p| p.amount).sum();

    let mut total_pending = Decimal::ZERO;
    let mut total_overdue = Decimal::ZERO;
    let mut pending_count = 0;
    let mut overdue: Vec<Fee> = Vec::new();
    for fee in fees {
        match derive_effective_status(fee, as_of) {
            FeeStatus::Pending => {
                total_pending += fee.amount;
                pending_count += 1;
            }
            FeeStatus::Overdue => {
                total_overdue += fee.amount;
                let mut fee = fee.clone();
                fee.status = FeeStatus::Overdue;
                overdue.push(fee);
            }
            FeeStatus::Paid => {}
        }
    }
    let overdue_count = overdue.len();
    overdue.sort_by_key(|f| (f.due_date, f.id));
    overdue.truncate(OLDEST_OVERDUE);

    let mut recent_payments = payments.to_vec();
    recent_payments.sort_by(|a, b| {
        b.payment_date
            .cmp(&a.payment_date)
            .then_with(|| b.id.cmp(&a.id))
    });
    recent_payments.truncate(RECENT_PAYMENTS);

    LedgerSummary {
        as_of,
        total_collected: money::normalize(total_collected),
        total_pending: money::normalize(total_pending),
        total_overdue: money::normalize(total_overdue),
        pending_count,
        overdue_count,
        total_clients: clients.len(),
        active_clients: clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        recent_payments,
        oldest_overdue: overdue,
    }
}
