mod client;
mod fee;
pub mod money;
mod payment;

pub use client::{Client, ClientFilter, ClientPatch, ClientStatus, NewClient};
pub use fee::{Fee, FeeCategory, FeeFilter, FeePatch, FeeStatus, NewFee};
pub use payment::{NewPayment, Payment, PaymentFilter, PaymentMethod, PaymentPatch};

use std::fmt;

pub type ClientId = u32;
pub type FeeId = u32;
pub type PaymentId = u32;

/// The three record kinds held by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Client,
    Fee,
    Payment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Client => write!(f, "client"),
            RecordKind::Fee => write!(f, "fee"),
            RecordKind::Payment => write!(f, "payment"),
        }
    }
}

/// Identity shared by every stored record
pub trait Record {
    const KIND: RecordKind;

    fn id(&self) -> u32;
}

impl Record for Client {
    const KIND: RecordKind = RecordKind::Client;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Record for Fee {
    const KIND: RecordKind = RecordKind::Fee;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Record for Payment {
    const KIND: RecordKind = RecordKind::Payment;

    fn id(&self) -> u32 {
        self.id
    }
}

/// Normalize free-form enum input: "Bank Transfer", "bank-transfer" and
/// "bank_transfer" all become "banktransfer".
pub(crate) fn fold_label(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive substring test used by the list filters
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
