//! Per-transaction execution outcomes.
//!
//! Each mined transaction produces a [`Receipt`] recording what happened to
//! it. Receipts are sealed into their block in application order, so every
//! submitted transaction's fate stays observable after the fact; nothing
//! fails silently.

use crate::core::transaction::Transaction;
use crate::ledger::{LedgerError, StateDelta};

/// What one transaction did to the ledger during a mining pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The ledger call committed; carries the post-values it wrote.
    Applied(StateDelta),
    /// The ledger call failed and left no trace; carries the reason.
    Reverted(LedgerError),
}

/// A mined transaction paired with its outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// The transaction exactly as submitted.
    pub transaction: Transaction,
    /// Applied with its deltas, or reverted with its reason.
    pub outcome: Outcome,
}

impl Receipt {
    /// Returns `true` if the transaction applied.
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied(_))
    }

    /// Returns the revert reason, if the transaction reverted.
    pub fn revert_reason(&self) -> Option<&LedgerError> {
        match &self.outcome {
            Outcome::Reverted(reason) => Some(reason),
            Outcome::Applied(_) => None,
        }
    }
}
