//! Fee status cascade.
//!
//! Stored transitions are driven by payments: recording one forces `paid`,
//! removing one forces `pending`. `overdue` is derived when fees are read and
//! is not written back.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::model::{Fee, FeeId, FeePatch, FeeStatus, RecordKind};
use crate::store::RecordStore;

/// Status a fee should be shown with on `as_of`.
///
/// A stored `pending` fee whose due date is strictly before `as_of` reads as
/// `overdue`; every other stored status is returned unchanged.
pub fn derive_effective_status(fee: &Fee, as_of: NaiveDate) -> FeeStatus {
    match fee.status {
        FeeStatus::Pending if as_of > fee.due_date => FeeStatus::Overdue,
        stored => stored,
    }
}

/// Replace each fee's status with its effective status on `as_of`
pub fn apply_effective_status(fees: &mut [Fee], as_of: NaiveDate) {
    for fee in fees {
        fee.status = derive_effective_status(fee, as_of);
    }
}

/// Mark a fee `paid` after a settling payment was recorded. Does not look at
/// the current status.
pub fn on_payment_recorded<S: RecordStore + ?Sized>(store: &S, fee_id: FeeId) -> Result<Fee> {
    set_status(store, fee_id, FeeStatus::Paid)
}

/// Return a fee to `pending` after its settling payment was removed. Does
/// not re-derive `overdue`; the next read does that.
pub fn on_payment_removed<S: RecordStore + ?Sized>(store: &S, fee_id: FeeId) -> Result<Fee> {
    set_status(store, fee_id, FeeStatus::Pending)
}

fn set_status<S: RecordStore + ?Sized>(store: &S, fee_id: FeeId, status: FeeStatus) -> Result<Fee> {
    let fee = store
        .update_fee(fee_id, FeePatch::status(status))
        .map_err(|e| LedgerError::write(RecordKind::Fee, e))?;
    debug!(fee_id, %status, "fee status updated");
    Ok(fee)
}
