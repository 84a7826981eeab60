//! Token ledger: account balances, spending allowances, and the three
//! mutating operations (`mint`, `approve`, `transfer_from`).
//!
//! Every mutating operation is check-then-commit: all preconditions are
//! verified before the first write, so a failed call leaves the ledger
//! exactly as it was. Amounts are `u128` and all arithmetic that could grow a
//! value is checked, so 10^18-scaled token quantities stay exact and nothing
//! ever wraps.

use crate::types::address::Address;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by ledger operations.
///
/// `InsufficientAllowance` and `InsufficientBalance` are the recoverable
/// outcomes a mining pass records as revert reasons. `InvalidArgument` covers
/// calls that are malformed regardless of state (zero addresses, amounts that
/// would overflow the supply); those fail the call without touching the
/// ledger either.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The spender's allowance from the owner does not cover the amount.
    #[error(
        "insufficient allowance: {spender} is approved for {approved} of {owner}'s tokens, needs {required}"
    )]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        approved: u128,
        required: u128,
    },
    /// The owner's balance does not cover the amount.
    #[error("insufficient balance: {account} holds {held}, needs {required}")]
    InsufficientBalance {
        account: Address,
        held: u128,
        required: u128,
    },
    /// The call itself was malformed, independent of ledger state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Post-application values of every ledger entry one operation touched.
///
/// Entries carry the values as they stand after the write, so replaying a
/// sequence of deltas reproduces the same final state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    /// (account, balance after the operation)
    pub balances: Vec<(Address, u128)>,
    /// (owner, spender, allowance after the operation)
    pub allowances: Vec<(Address, Address, u128)>,
}

/// Mutable ledger state guarded by the outer mutex.
#[derive(Default)]
struct LedgerInner {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    total_supply: u128,
}

/// Account balances and spending allowances for one simulated token.
///
/// Each operation holds the inner lock for its whole critical section, so
/// checks and writes are atomic per call. The miner's apply loop is the only
/// mutating caller during a simulation; reads are safe from anywhere.
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Creates an empty ledger: no accounts, no allowances, zero supply.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    /// Credits `to` with freshly issued tokens and grows the total supply.
    ///
    /// Issuance is unrestricted: the caller's identity is recorded on the
    /// surrounding transaction, not checked here.
    pub fn mint(&self, to: Address, amount: u128) -> Result<StateDelta, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "mint to the zero address".into(),
            ));
        }

        let mut inner = self.inner.lock().unwrap();
        let supply = inner.total_supply.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidArgument(format!("minting {amount} overflows the total supply"))
        })?;

        inner.total_supply = supply;
        let balance = inner.balances.entry(to).or_insert(0);
        // Cannot wrap: every balance is bounded by the checked total supply.
        *balance += amount;
        let balance = *balance;

        Ok(StateDelta {
            balances: vec![(to, balance)],
            allowances: Vec::new(),
        })
    }

    /// Sets the allowance of `spender` over `owner`'s tokens to exactly
    /// `amount`.
    ///
    /// This is an absolute overwrite, never a delta: whatever allowance was in
    /// place is replaced, including one partially spent earlier in the same
    /// block. That overwrite is what makes approvals front-runnable.
    pub fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: u128,
    ) -> Result<StateDelta, LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "approve from the zero address".into(),
            ));
        }
        if spender.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "approve to the zero address".into(),
            ));
        }

        let mut inner = self.inner.lock().unwrap();
        inner.allowances.insert((owner, spender), amount);

        Ok(StateDelta {
            balances: Vec::new(),
            allowances: vec![(owner, spender, amount)],
        })
    }

    /// Moves `amount` of `owner`'s tokens to `recipient` on `spender`'s
    /// authority.
    ///
    /// Preconditions run in a fixed order before any write: the allowance
    /// check first, the balance check second. When both are short, the
    /// allowance failure is the one reported. On success the allowance
    /// decrement and both balance moves commit in the same critical section.
    pub fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: u128,
    ) -> Result<StateDelta, LedgerError> {
        if recipient.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "transfer to the zero address".into(),
            ));
        }

        let mut inner = self.inner.lock().unwrap();

        let approved = inner
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner,
                spender,
                approved,
                required: amount,
            });
        }

        let held = inner.balances.get(&owner).copied().unwrap_or(0);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                account: owner,
                held,
                required: amount,
            });
        }

        inner.allowances.insert((owner, spender), approved - amount);

        let delta = if owner == recipient {
            // Self-transfer: the balance is untouched, the allowance still burns.
            StateDelta {
                balances: vec![(owner, held)],
                allowances: vec![(owner, spender, approved - amount)],
            }
        } else {
            inner.balances.insert(owner, held - amount);
            let credited = inner.balances.entry(recipient).or_insert(0);
            // Cannot wrap: the sum of balances never exceeds the checked supply.
            *credited += amount;
            let credited = *credited;

            StateDelta {
                balances: vec![(owner, held - amount), (recipient, credited)],
                allowances: vec![(owner, spender, approved - amount)],
            }
        };

        Ok(delta)
    }

    /// Returns the balance of `account`; unknown accounts read as zero.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(&account)
            .copied()
            .unwrap_or(0)
    }

    /// Returns what `spender` may still move from `owner`; absent entries
    /// read as zero.
    pub fn allowance_of(&self, owner: Address, spender: Address) -> u128 {
        self.inner
            .lock()
            .unwrap()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the total minted supply.
    pub fn total_supply(&self) -> u128 {
        self.inner.lock().unwrap().total_supply
    }

    /// Sum of every account balance, for conservation checks.
    ///
    /// Holds after every block: `balance_sum() == total_supply()`.
    pub fn balance_sum(&self) -> u128 {
        self.inner.lock().unwrap().balances.values().sum()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
