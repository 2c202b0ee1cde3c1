pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod store;

pub use config::{Backend, Config};
pub use error::{LedgerError, Result};
pub use ledger::{CascadeStep, CascadeWarning, Ledger, Outcome, PaymentPolicy};
pub use model::{Client, Fee, FeeStatus, Payment};
pub use store::{FileStore, MemoryStore, RecordStore, RemoteStore};
