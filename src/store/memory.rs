use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::{RecordStore, Result, StoreError, Tables};
use crate::model::{
    Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch, NewClient,
    NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch, RecordKind,
};

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// Isolated in-memory record store.
///
/// Failures can be injected per record kind and operation; an injected
/// failure rejects every matching call until cleared.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failures: Mutex<HashSet<(RecordKind, Operation)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-built tables, bypassing creation defaults
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
            failures: Mutex::default(),
        }
    }

    pub fn snapshot(&self) -> Tables {
        lock(&self.tables).clone()
    }

    pub fn fail_on(&self, kind: RecordKind, op: Operation) {
        lock(&self.failures).insert((kind, op));
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    fn check(&self, kind: RecordKind, op: Operation) -> Result<MutexGuard<'_, Tables>> {
        if lock(&self.failures).contains(&(kind, op)) {
            return Err(StoreError::Rejected(format!(
                "injected failure on {op:?} {kind}"
            )));
        }
        Ok(lock(&self.tables))
    }
}

impl RecordStore for MemoryStore {
    fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>> {
        Ok(self.check(RecordKind::Client, Operation::List)?.list_clients(filter))
    }

    fn get_client(&self, id: ClientId) -> Result<Client> {
        self.check(RecordKind::Client, Operation::Get)?.get_client(id)
    }

    fn create_client(&self, fields: NewClient) -> Result<Client> {
        Ok(self
            .check(RecordKind::Client, Operation::Create)?
            .insert_client(fields))
    }

    fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client> {
        self.check(RecordKind::Client, Operation::Update)?
            .update_client(id, &patch)
    }

    fn delete_client(&self, id: ClientId) -> Result<Client> {
        self.check(RecordKind::Client, Operation::Delete)?
            .remove_client(id)
    }

    fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>> {
        Ok(self.check(RecordKind::Fee, Operation::List)?.list_fees(filter))
    }

    fn get_fee(&self, id: FeeId) -> Result<Fee> {
        self.check(RecordKind::Fee, Operation::Get)?.get_fee(id)
    }

    fn create_fee(&self, fields: NewFee) -> Result<Fee> {
        Ok(self.check(RecordKind::Fee, Operation::Create)?.insert_fee(fields))
    }

    fn update_fee(&self, id: FeeId, patch: FeePatch) -> Result<Fee> {
        self.check(RecordKind::Fee, Operation::Update)?
            .update_fee(id, &patch)
    }

    fn delete_fee(&self, id: FeeId) -> Result<Fee> {
        self.check(RecordKind::Fee, Operation::Delete)?.remove_fee(id)
    }

    fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        Ok(self
            .check(RecordKind::Payment, Operation::List)?
            .list_payments(filter))
    }

    fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.check(RecordKind::Payment, Operation::Get)?
            .get_payment(id)
    }

    fn create_payment(&self, fields: NewPayment) -> Result<Payment> {
        Ok(self
            .check(RecordKind::Payment, Operation::Create)?
            .insert_payment(fields))
    }

    fn update_payment(&self, id: PaymentId, patch: PaymentPatch) -> Result<Payment> {
        self.check(RecordKind::Payment, Operation::Update)?
            .update_payment(id, &patch)
    }

    fn delete_payment(&self, id: PaymentId) -> Result<Payment> {
        self.check(RecordKind::Payment, Operation::Delete)?
            .remove_payment(id)
    }
}
