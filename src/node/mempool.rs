//! Holding area for submitted transactions awaiting a mining pass.

use crate::core::transaction::{Transaction, TxId};
use dashmap::DashMap;
use std::sync::RwLock;

/// Unordered pool of transactions waiting for a mining pass.
///
/// The pool stores no priority: ordering is the miner's job at drain time.
/// The id map and the submission-order list are mutated together under the
/// write lock, so a drain takes a consistent snapshot and a concurrent append
/// lands entirely before or entirely after it; nothing is lost or duplicated.
pub struct Mempool {
    /// Pending transactions indexed by id for O(1) lookup and withdrawal.
    transactions: DashMap<TxId, Transaction>,
    /// Submission order, for inspection and deterministic draining.
    order: RwLock<Vec<TxId>>,
}

impl Mempool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Adds a transaction to the pool if its id is not already present.
    pub fn append(&self, transaction: Transaction) {
        let mut order = self.order.write().unwrap();
        let id = transaction.id;
        if !self.transactions.contains_key(&id) {
            self.transactions.insert(id, transaction);
            order.push(id);
        }
    }

    /// Takes everything out of the pool as one batch, in submission order.
    pub fn drain(&self) -> Vec<Transaction> {
        let mut order = self.order.write().unwrap();
        let ids = std::mem::take(&mut *order);
        ids.iter()
            .filter_map(|id| self.transactions.remove(id).map(|(_, tx)| tx))
            .collect()
    }

    /// Withdraws a single pending transaction, returning it if present.
    pub fn remove(&self, id: TxId) -> Option<Transaction> {
        let mut order = self.order.write().unwrap();
        let removed = self.transactions.remove(&id).map(|(_, tx)| tx);
        if removed.is_some() {
            order.retain(|queued| *queued != id);
        }
        removed
    }

    /// Returns the pending transactions in submission order, without
    /// draining them.
    pub fn pending(&self) -> Vec<Transaction> {
        let order = self.order.read().unwrap();
        order
            .iter()
            .filter_map(|id| self.transactions.get(id).map(|e| e.clone()))
            .collect()
    }

    /// Returns `true` if a transaction with this id is pending.
    pub fn contains(&self, id: TxId) -> bool {
        self.transactions.contains_key(&id)
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}
