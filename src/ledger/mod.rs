//! Balance and status reconciliation.
//!
//! A client's totals and a fee's status are derived from other records. The
//! [`Ledger`] sequences the primary write and the dependent writes, and
//! reports a failed dependent write as a [`CascadeWarning`] next to the
//! committed result.

mod orchestrator;
mod outcome;
pub mod reconcile;
pub mod status;
pub mod summary;

pub use orchestrator::{Ledger, PaymentPolicy};
pub use outcome::{CascadeStep, CascadeWarning, Outcome};
pub use reconcile::{compute_totals, recompute_client_totals, reconcile_all, ClientTotals};
pub use status::{derive_effective_status, on_payment_recorded, on_payment_removed};
pub use summary::{summarize, LedgerSummary};
