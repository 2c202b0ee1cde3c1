use std::fmt;

use crate::error::{LedgerError, Result};
use crate::model::{ClientId, FeeId};

/// Dependent write that runs after a primary write has committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// Moving a fee to `paid` or back to `pending`
    FeeStatus { fee_id: FeeId },
    /// Recomputing a client's due/paid totals
    ClientTotals { client_id: ClientId },
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeStep::FeeStatus { fee_id } => write!(f, "status update of fee {fee_id}"),
            CascadeStep::ClientTotals { client_id } => {
                write!(f, "totals recomputation of client {client_id}")
            }
        }
    }
}

/// A cascade step that failed after the primary write committed
#[derive(Debug)]
pub struct CascadeWarning {
    pub step: CascadeStep,
    pub cause: LedgerError,
}

impl fmt::Display for CascadeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.cause)
    }
}

/// Result of a mutating ledger operation: the committed primary record plus
/// any cascade steps that did not complete.
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub record: T,
    pub warnings: Vec<CascadeWarning>,
}

impl<T> Outcome<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// First cascade step that failed, if any
    pub fn partial_failure(&self) -> Option<&CascadeWarning> {
        self.warnings.first()
    }

    /// Collapse into a plain result, turning the first cascade failure into
    /// [`LedgerError::PartialFailure`]
    pub fn into_result(self) -> Result<T> {
        match self.warnings.into_iter().next() {
            None => Ok(self.record),
            Some(warning) => Err(LedgerError::PartialFailure {
                step: warning.step,
                cause: Box::new(warning.cause),
            }),
        }
    }

    pub(crate) fn warn(&mut self, step: CascadeStep, cause: LedgerError) {
        self.warnings.push(CascadeWarning { step, cause });
    }
}
