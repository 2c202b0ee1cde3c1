use std::path::PathBuf;
use thiserror::Error;

use crate::ledger::CascadeStep;
use crate::model::{FeeId, RecordKind};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Config directory not found at {0}. Run 'feeledger init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Remote store selected but no [store.remote] section in config.toml")]
    RemoteNotConfigured,

    #[error("The {kind} with id {id} was not found")]
    NotFound { kind: RecordKind, id: u32 },

    #[error("Failed to read {kind} records: {source}")]
    ReadFailed {
        kind: RecordKind,
        #[source]
        source: StoreError,
    },

    #[error("Failed to write {kind} record: {source}")]
    WriteFailed {
        kind: RecordKind,
        #[source]
        source: StoreError,
    },

    #[error("Primary write succeeded but the {step} failed: {cause}")]
    PartialFailure {
        step: CascadeStep,
        #[source]
        cause: Box<LedgerError>,
    },

    #[error("Invalid amount '{0}'. Amounts must be positive numbers")]
    InvalidAmount(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Fee {0} is already paid")]
    FeeAlreadyPaid(FeeId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Classify a failed store read. A missing record stays `NotFound`.
    pub fn read(kind: RecordKind, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { kind, id } => LedgerError::NotFound { kind, id },
            source => LedgerError::ReadFailed { kind, source },
        }
    }

    /// Classify a failed store write. A missing record stays `NotFound`.
    pub fn write(kind: RecordKind, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { kind, id } => LedgerError::NotFound { kind, id },
            source => LedgerError::WriteFailed { kind, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
