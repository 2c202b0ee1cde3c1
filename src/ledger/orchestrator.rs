use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::outcome::{CascadeStep, Outcome};
use super::reconcile::{self, ClientTotals};
use super::status;
use super::summary::{summarize, LedgerSummary};
use crate::error::{LedgerError, Result};
use crate::model::{
    money, Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch,
    FeeStatus, NewClient, NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch,
    RecordKind,
};
use crate::store::RecordStore;

/// What to do when a payment targets a fee that is already stored `paid`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentPolicy {
    pub reject_payments_on_paid_fees: bool,
}

/// Entry point for every fee and payment mutation.
///
/// Each mutation performs its primary write first. If that fails nothing
/// else runs and the error is returned. Once it has committed, dependent
/// writes (fee status, client totals) run in order; their failures are
/// collected on the [`Outcome`] instead of undoing the primary write.
pub struct Ledger<S> {
    store: S,
    policy: PaymentPolicy,
}

impl<S: RecordStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, PaymentPolicy::default())
    }

    pub fn with_policy(store: S, policy: PaymentPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Clients

    pub fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>> {
        self.store
            .list_clients(filter)
            .map_err(|e| LedgerError::read(RecordKind::Client, e))
    }

    pub fn get_client(&self, id: ClientId) -> Result<Client> {
        self.store
            .get_client(id)
            .map_err(|e| LedgerError::read(RecordKind::Client, e))
    }

    pub fn create_client(&self, fields: NewClient) -> Result<Client> {
        let client = self
            .store
            .create_client(fields)
            .map_err(|e| LedgerError::write(RecordKind::Client, e))?;
        info!(client_id = client.id, name = %client.name, "created client");
        Ok(client)
    }

    /// Update authored client fields. Totals are derived and cannot be set
    /// through this call.
    pub fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client> {
        if patch.touches_totals() {
            debug!(client_id = id, "ignoring totals in client update");
        }
        let client = self
            .store
            .update_client(id, patch.without_totals())
            .map_err(|e| LedgerError::write(RecordKind::Client, e))?;
        info!(client_id = id, "updated client");
        Ok(client)
    }

    /// Delete a client. Its fees are left in place.
    pub fn delete_client(&self, id: ClientId) -> Result<Client> {
        let client = self
            .store
            .delete_client(id)
            .map_err(|e| LedgerError::write(RecordKind::Client, e))?;
        info!(client_id = id, "deleted client");
        Ok(client)
    }

    /// Recompute one client's totals
    pub fn reconcile_client(&self, id: ClientId) -> Result<ClientTotals> {
        reconcile::recompute_client_totals(&self.store, id)
    }

    /// Recompute every client's totals
    pub fn reconcile_all(&self) -> Result<Vec<(ClientId, Result<ClientTotals>)>> {
        reconcile::reconcile_all(&self.store)
    }

    // Fees

    /// List fees with their effective status on `as_of`. A status filter
    /// matches the effective status, not the stored one.
    pub fn list_fees(&self, filter: &FeeFilter, as_of: NaiveDate) -> Result<Vec<Fee>> {
        let stored = FeeFilter {
            status: None,
            ..filter.clone()
        };
        let mut fees = self
            .store
            .list_fees(&stored)
            .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
        status::apply_effective_status(&mut fees, as_of);
        fees.retain(|f| filter.matches(f));
        Ok(fees)
    }

    pub fn get_fee(&self, id: FeeId, as_of: NaiveDate) -> Result<Fee> {
        let mut fee = self
            .store
            .get_fee(id)
            .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
        fee.status = status::derive_effective_status(&fee, as_of);
        Ok(fee)
    }

    pub fn create_fee(&self, mut fields: NewFee) -> Result<Outcome<Fee>> {
        fields.amount = money::positive(fields.amount)?;
        self.get_client(fields.client_id)?;

        let fee = self
            .store
            .create_fee(fields)
            .map_err(|e| LedgerError::write(RecordKind::Fee, e))?;
        info!(fee_id = fee.id, client_id = fee.client_id, amount = %fee.amount, "created fee");

        let mut outcome = Outcome::new(fee);
        let client_id = outcome.record.client_id;
        self.refresh_totals(&mut outcome, client_id);
        Ok(outcome)
    }

    /// Update a fee. When the fee moves to another client both the previous
    /// and the new owner are reconciled.
    pub fn update_fee(&self, id: FeeId, mut patch: FeePatch) -> Result<Outcome<Fee>> {
        if let Some(amount) = patch.amount {
            patch.amount = Some(money::positive(amount)?);
        }
        let before = self
            .store
            .get_fee(id)
            .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
        if let Some(client_id) = patch.client_id.filter(|c| *c != before.client_id) {
            self.get_client(client_id)?;
        }

        let fee = self
            .store
            .update_fee(id, patch)
            .map_err(|e| LedgerError::write(RecordKind::Fee, e))?;
        info!(fee_id = id, client_id = fee.client_id, "updated fee");

        let mut outcome = Outcome::new(fee);
        self.refresh_totals(&mut outcome, before.client_id);
        let client_id = outcome.record.client_id;
        if client_id != before.client_id {
            self.refresh_totals(&mut outcome, client_id);
        }
        Ok(outcome)
    }

    /// Delete a fee. Payments referencing it are left in place.
    pub fn delete_fee(&self, id: FeeId) -> Result<Outcome<Fee>> {
        let fee = self
            .store
            .delete_fee(id)
            .map_err(|e| LedgerError::write(RecordKind::Fee, e))?;
        info!(fee_id = id, client_id = fee.client_id, "deleted fee");

        let mut outcome = Outcome::new(fee);
        let client_id = outcome.record.client_id;
        self.refresh_totals(&mut outcome, client_id);
        Ok(outcome)
    }

    // Payments

    pub fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        self.store
            .list_payments(filter)
            .map_err(|e| LedgerError::read(RecordKind::Payment, e))
    }

    pub fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.store
            .get_payment(id)
            .map_err(|e| LedgerError::read(RecordKind::Payment, e))
    }

    /// Record a payment and settle its fee.
    ///
    /// The fee must exist; otherwise nothing is written.
    pub fn create_payment(&self, mut fields: NewPayment) -> Result<Outcome<Payment>> {
        fields.amount = money::positive(fields.amount)?;
        let fee = self
            .store
            .get_fee(fields.fee_id)
            .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
        self.check_settleable(&fee)?;

        let payment = self
            .store
            .create_payment(fields)
            .map_err(|e| LedgerError::write(RecordKind::Payment, e))?;
        info!(
            payment_id = payment.id,
            fee_id = payment.fee_id,
            amount = %payment.amount,
            "recorded payment"
        );

        let mut outcome = Outcome::new(payment);
        let fee_id = outcome.record.fee_id;
        self.settle(&mut outcome, fee_id);
        Ok(outcome)
    }

    /// Update a payment. Moving it to another fee releases the old fee and
    /// settles the new one.
    pub fn update_payment(&self, id: PaymentId, mut patch: PaymentPatch) -> Result<Outcome<Payment>> {
        if let Some(amount) = patch.amount {
            patch.amount = Some(money::positive(amount)?);
        }
        let before = self
            .store
            .get_payment(id)
            .map_err(|e| LedgerError::read(RecordKind::Payment, e))?;
        if let Some(fee_id) = patch.fee_id.filter(|f| *f != before.fee_id) {
            let fee = self
                .store
                .get_fee(fee_id)
                .map_err(|e| LedgerError::read(RecordKind::Fee, e))?;
            self.check_settleable(&fee)?;
        }

        let payment = self
            .store
            .update_payment(id, patch)
            .map_err(|e| LedgerError::write(RecordKind::Payment, e))?;
        info!(payment_id = id, fee_id = payment.fee_id, "updated payment");

        let mut outcome = Outcome::new(payment);
        let fee_id = outcome.record.fee_id;
        if fee_id != before.fee_id {
            self.release(&mut outcome, before.fee_id);
            self.settle(&mut outcome, fee_id);
        }
        Ok(outcome)
    }

    /// Delete a payment and return its fee to `pending`. A fee that no
    /// longer exists is skipped.
    pub fn delete_payment(&self, id: PaymentId) -> Result<Outcome<Payment>> {
        let payment = self
            .store
            .delete_payment(id)
            .map_err(|e| LedgerError::write(RecordKind::Payment, e))?;
        info!(payment_id = id, fee_id = payment.fee_id, "deleted payment");

        let mut outcome = Outcome::new(payment);
        let fee_id = outcome.record.fee_id;
        self.release(&mut outcome, fee_id);
        Ok(outcome)
    }

    /// Dashboard metrics over every record, with effective fee statuses
    pub fn summary(&self, as_of: NaiveDate) -> Result<LedgerSummary> {
        let clients = self.list_clients(&ClientFilter::default())?;
        let fees = self.list_fees(&FeeFilter::default(), as_of)?;
        let payments = self.list_payments(&PaymentFilter::default())?;
        Ok(summarize(&clients, &fees, &payments, as_of))
    }

    fn check_settleable(&self, fee: &Fee) -> Result<()> {
        if fee.status != FeeStatus::Paid {
            return Ok(());
        }
        if self.policy.reject_payments_on_paid_fees {
            return Err(LedgerError::FeeAlreadyPaid(fee.id));
        }
        warn!(fee_id = fee.id, "recording another payment against a paid fee");
        Ok(())
    }

    fn settle<T>(&self, outcome: &mut Outcome<T>, fee_id: FeeId) {
        match status::on_payment_recorded(&self.store, fee_id) {
            Ok(fee) => self.refresh_totals(outcome, fee.client_id),
            Err(e) => {
                warn!(fee_id, error = %e, "payment recorded but fee status not updated");
                outcome.warn(CascadeStep::FeeStatus { fee_id }, e);
            }
        }
    }

    fn release<T>(&self, outcome: &mut Outcome<T>, fee_id: FeeId) {
        match status::on_payment_removed(&self.store, fee_id) {
            Ok(fee) => self.refresh_totals(outcome, fee.client_id),
            Err(e) if e.is_not_found() => {
                debug!(fee_id, "fee already gone, nothing to release");
            }
            Err(e) => {
                warn!(fee_id, error = %e, "payment removed but fee status not updated");
                outcome.warn(CascadeStep::FeeStatus { fee_id }, e);
            }
        }
    }

    fn refresh_totals<T>(&self, outcome: &mut Outcome<T>, client_id: ClientId) {
        match reconcile::recompute_client_totals(&self.store, client_id) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(client_id, "client gone, no totals to refresh");
            }
            Err(e) => {
                warn!(client_id, error = %e, "client totals not refreshed");
                outcome.warn(CascadeStep::ClientTotals { client_id }, e);
            }
        }
    }
}
