//! Record store contract and its adapters.
//!
//! Every adapter speaks canonical field names; any renaming required by a
//! backend happens inside that adapter and nowhere else.

mod file;
mod memory;
mod remote;
mod tables;
mod wire;

pub use file::FileStore;
pub use memory::{MemoryStore, Operation};
pub use remote::RemoteStore;
pub use tables::{LastIds, Tables};

use thiserror::Error;

use crate::model::{
    Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch, NewClient,
    NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch, RecordKind,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} {id} does not exist")]
    NotFound { kind: RecordKind, id: u32 },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("store unreachable: {0}")]
    Transport(String),

    #[error("malformed record data: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Create/read/update/delete access to clients, fees and payments.
///
/// Each call is atomic for the single record it touches; nothing spans
/// records. `delete_*` returns the record as it was before removal.
pub trait RecordStore {
    fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>>;
    fn get_client(&self, id: ClientId) -> Result<Client>;
    fn create_client(&self, fields: NewClient) -> Result<Client>;
    fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client>;
    fn delete_client(&self, id: ClientId) -> Result<Client>;

    fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>>;
    fn get_fee(&self, id: FeeId) -> Result<Fee>;
    fn create_fee(&self, fields: NewFee) -> Result<Fee>;
    fn update_fee(&self, id: FeeId, patch: FeePatch) -> Result<Fee>;
    fn delete_fee(&self, id: FeeId) -> Result<Fee>;

    fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>>;
    fn get_payment(&self, id: PaymentId) -> Result<Payment>;
    fn create_payment(&self, fields: NewPayment) -> Result<Payment>;
    fn update_payment(&self, id: PaymentId, patch: PaymentPatch) -> Result<Payment>;
    fn delete_payment(&self, id: PaymentId) -> Result<Payment>;
}
