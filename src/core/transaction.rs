//! Immutable transaction descriptions submitted for mining.

use crate::types::address::Address;

/// Monotonic sequence number assigned when a transaction is submitted.
///
/// Ids grow in submission order and never repeat, which makes them the
/// deterministic tie-break key when gas prices are equal.
pub type TxId = u64;

/// The ledger call a transaction performs once mined.
///
/// Arguments are statically typed. The party each variant leaves out
/// (the approving owner, the spending caller) is the transaction sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Issue `amount` new tokens to `to`.
    Mint { to: Address, amount: u128 },
    /// Set the sender's allowance for `spender` to exactly `amount`.
    Approve { spender: Address, amount: u128 },
    /// Move `amount` of `owner`'s tokens to `recipient` on the sender's
    /// authority.
    TransferFrom {
        owner: Address,
        recipient: Address,
        amount: u128,
    },
}

impl Operation {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Mint { .. } => "mint",
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transferFrom",
        }
    }
}

/// A single submitted ledger call, frozen at submission time.
///
/// Transactions are immutable once created: the mempool and the miner move or
/// clone them but never rewrite a field. Each one is consumed by exactly one
/// block and its outcome recorded there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Submission sequence number; the ordering tie-break key.
    pub id: TxId,
    /// Account that issued the call.
    pub sender: Address,
    /// The ledger call to perform.
    pub operation: Operation,
    /// Ordinal mining priority: higher prices mine earlier.
    pub gas_price: u128,
    /// Advisory execution budget; recorded but never enforced.
    pub gas_limit: u64,
}

impl Transaction {
    /// Creates a transaction with every field fixed.
    pub fn new(
        id: TxId,
        sender: Address,
        operation: Operation,
        gas_price: u128,
        gas_limit: u64,
    ) -> Self {
        Self {
            id,
            sender,
            operation,
            gas_price,
            gas_limit,
        }
    }
}
