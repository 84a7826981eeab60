//! Simulated node: submission entry points, automine control, mining.
//!
//! - [`mempool`]: holding area for pending transactions
//! - [`Node`]: the facade wiring mempool, miner, and ledger together

pub mod mempool;

use crate::core::block::Block;
use crate::core::chain::Chain;
use crate::core::receipt::Receipt;
use crate::core::transaction::{Operation, Transaction, TxId};
use crate::ledger::{Ledger, LedgerError};
use crate::node::mempool::Mempool;
use crate::types::address::Address;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What [`Node::submit`] produced, depending on the automine mode.
#[derive(Clone, Debug)]
pub enum Submission {
    /// Automine was off: the transaction is queued under this id.
    Pending(TxId),
    /// Automine was on: the transaction was mined immediately as a
    /// single-transaction block.
    Mined(Arc<Block>),
}

/// A single-process simulated node.
///
/// Owns the chain, the mempool, and the automine flag, and stamps every
/// submission with its monotonic id. All entry points take `&self`; the
/// internal locks do the serializing, and the ledger is only ever mutated
/// from inside the miner's apply loop.
pub struct Node {
    chain: Chain,
    mempool: Mempool,
    automine: AtomicBool,
    next_id: AtomicU64,
}

impl Node {
    /// Creates a node over an empty ledger with automine enabled.
    pub fn new() -> Self {
        Self {
            chain: Chain::new(Ledger::new()),
            mempool: Mempool::new(),
            automine: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns `true` if submissions mine immediately.
    pub fn automine(&self) -> bool {
        self.automine.load(Ordering::SeqCst)
    }

    /// Switches between immediate and batched mining. Idempotent.
    ///
    /// Pending transactions stay queued across a switch; only an explicit
    /// [`Node::mine`] consumes them.
    pub fn set_automine(&self, enabled: bool) {
        let was = self.automine.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            info!("automine {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Submits a ledger call for mining.
    ///
    /// Stamps the next submission id on the call, then either mines it
    /// immediately as a singleton batch (automine on) or queues it and hands
    /// back the id (automine off). Zero gas parameters are rejected before an
    /// id is consumed.
    pub fn submit(
        &self,
        sender: Address,
        operation: Operation,
        gas_price: u128,
        gas_limit: u64,
    ) -> Result<Submission, LedgerError> {
        if gas_price == 0 || gas_limit == 0 {
            warn!("rejected submission from {sender}: zero gas parameters");
            return Err(LedgerError::InvalidArgument(
                "gas price and gas limit must be nonzero".into(),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let transaction = Transaction::new(id, sender, operation, gas_price, gas_limit);

        if self.automine() {
            let block = self.chain.mine_batch(vec![transaction]);
            Ok(Submission::Mined(block))
        } else {
            debug!("transaction {id} ({}) queued", transaction.operation.name());
            self.mempool.append(transaction);
            Ok(Submission::Pending(id))
        }
    }

    /// Drains the entire mempool as one batch and mines it.
    ///
    /// Works in either mode; an empty mempool still seals an empty block.
    pub fn mine(&self) -> Arc<Block> {
        self.chain.mine_batch(self.mempool.drain())
    }

    /// Withdraws a transaction that has not been mined yet.
    ///
    /// Returns the transaction while it is still pending; `None` once a
    /// mining pass has drained it (or if it was never queued).
    pub fn drop_transaction(&self, id: TxId) -> Option<Transaction> {
        let dropped = self.mempool.remove(id);
        if dropped.is_some() {
            debug!("transaction {id} dropped from the mempool");
        }
        dropped
    }

    /// Pending transactions in submission order, without mining them.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.mempool.pending()
    }

    /// Balance of `account`; unknown accounts read as zero.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.chain.ledger().balance_of(account)
    }

    /// Remaining allowance of `spender` over `owner`'s tokens.
    pub fn allowance_of(&self, owner: Address, spender: Address) -> u128 {
        self.chain.ledger().allowance_of(owner, spender)
    }

    /// Total minted supply.
    pub fn total_supply(&self) -> u128 {
        self.chain.ledger().total_supply()
    }

    /// Height of the latest sealed block.
    pub fn height(&self) -> u64 {
        self.chain.height()
    }

    /// Latest sealed block.
    pub fn latest_block(&self) -> Arc<Block> {
        self.chain.latest_block()
    }

    /// Block at `number`, if sealed.
    pub fn get_block(&self, number: u64) -> Option<Arc<Block>> {
        self.chain.get_block(number)
    }

    /// Receipt of a mined transaction, if any block consumed it.
    pub fn receipt(&self, id: TxId) -> Option<Receipt> {
        self.chain.find_receipt(id)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hash::Hash;
    use crate::utils::test_utils::utils::{addr, mined, pending_id, units};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const GAS_LIMIT: u64 = 100_000;

    fn mint_op(to: Address, amount: u128) -> Operation {
        Operation::Mint { to, amount }
    }

    fn approve_op(spender: Address, amount: u128) -> Operation {
        Operation::Approve { spender, amount }
    }

    fn transfer_op(owner: Address, recipient: Address, amount: u128) -> Operation {
        Operation::TransferFrom {
            owner,
            recipient,
            amount,
        }
    }

    /// alice holds 5000 tokens and bob is approved for 1000, both mined.
    fn funded() -> (Node, Address, Address) {
        let node = Node::new();
        let (alice, bob) = (addr(1), addr(2));
        node.submit(addr(9), mint_op(alice, units(5000)), 1, GAS_LIMIT)
            .unwrap();
        node.submit(alice, approve_op(bob, units(1000)), 1, GAS_LIMIT)
            .unwrap();
        (node, alice, bob)
    }

    // ==================== Automine ====================

    #[test]
    fn automine_mines_each_submission_as_its_own_block() {
        let node = Node::new();
        assert!(node.automine());

        let block = mined(
            node.submit(addr(9), mint_op(addr(1), units(10)), 1, GAS_LIMIT)
                .unwrap(),
        );

        assert_eq!(block.number, 1);
        assert_eq!(block.receipts.len(), 1);
        assert!(block.receipts[0].is_applied());
        assert_eq!(node.balance_of(addr(1)), units(10));
        assert_eq!(node.height(), 1);
    }

    #[test]
    fn disabling_automine_queues_submissions() {
        let node = Node::new();
        node.set_automine(false);

        let id = pending_id(
            node.submit(addr(9), mint_op(addr(1), units(10)), 1, GAS_LIMIT)
                .unwrap(),
        );

        assert_eq!(id, 0);
        assert_eq!(node.balance_of(addr(1)), 0);
        assert_eq!(node.height(), 0);
        assert_eq!(node.pending_transactions().len(), 1);
    }

    #[test]
    fn set_automine_is_idempotent() {
        let node = Node::new();
        node.set_automine(false);
        node.set_automine(false);
        node.submit(addr(9), mint_op(addr(1), 1), 1, GAS_LIMIT)
            .unwrap();
        assert_eq!(node.pending_transactions().len(), 1);

        node.set_automine(true);
        node.set_automine(true);
        // Re-enabling never retroactively mines what was pending.
        assert_eq!(node.pending_transactions().len(), 1);
        assert_eq!(node.height(), 0);
    }

    #[test]
    fn reenabled_automine_mines_new_submissions_alone() {
        let node = Node::new();
        node.set_automine(false);
        node.submit(addr(9), mint_op(addr(1), units(1)), 1, GAS_LIMIT)
            .unwrap();

        node.set_automine(true);
        let block = mined(
            node.submit(addr(9), mint_op(addr(2), units(2)), 1, GAS_LIMIT)
                .unwrap(),
        );

        // The singleton block skipped the queued transaction.
        assert_eq!(block.receipts.len(), 1);
        assert_eq!(node.pending_transactions().len(), 1);
        assert_eq!(node.balance_of(addr(1)), 0);
        assert_eq!(node.balance_of(addr(2)), units(2));

        node.mine();
        assert_eq!(node.balance_of(addr(1)), units(1));
    }

    // ==================== Mining ====================

    #[test]
    fn mine_drains_the_whole_mempool_into_one_block() {
        let node = Node::new();
        node.set_automine(false);
        for tag in 1..=3u8 {
            node.submit(addr(9), mint_op(addr(tag), units(tag as u64)), 1, GAS_LIMIT)
                .unwrap();
        }

        let block = node.mine();

        assert_eq!(block.receipts.len(), 3);
        assert!(node.pending_transactions().is_empty());
        assert_eq!(node.total_supply(), units(6));
    }

    #[test]
    fn mine_with_empty_mempool_seals_an_empty_block() {
        let node = Node::new();
        let block = node.mine();

        assert!(block.receipts.is_empty());
        assert_eq!(block.number, 1);
        assert_eq!(node.height(), 1);
    }

    #[test]
    fn block_queries_expose_history() {
        let node = Node::new();
        let first = mined(
            node.submit(addr(9), mint_op(addr(1), 1), 1, GAS_LIMIT)
                .unwrap(),
        );

        assert_eq!(node.latest_block().hash, first.hash);
        assert_eq!(node.get_block(1).unwrap().hash, first.hash);
        assert_eq!(node.get_block(0).unwrap().parent_hash, Hash::ZERO);
        assert!(node.get_block(5).is_none());
    }

    #[test]
    fn submission_ids_are_monotonic_across_modes() {
        let node = Node::new();
        let first = mined(
            node.submit(addr(9), mint_op(addr(1), 1), 1, GAS_LIMIT)
                .unwrap(),
        );
        node.set_automine(false);
        let second = pending_id(
            node.submit(addr(9), mint_op(addr(1), 1), 1, GAS_LIMIT)
                .unwrap(),
        );

        assert_eq!(first.receipts[0].transaction.id, 0);
        assert_eq!(second, 1);
    }

    #[test]
    fn zero_gas_parameters_are_rejected_at_submission() {
        let node = Node::new();

        let zero_price = node.submit(addr(1), mint_op(addr(1), 1), 0, GAS_LIMIT);
        assert!(matches!(zero_price, Err(LedgerError::InvalidArgument(_))));

        let zero_limit = node.submit(addr(1), mint_op(addr(1), 1), 1, 0);
        assert!(matches!(zero_limit, Err(LedgerError::InvalidArgument(_))));

        assert_eq!(node.height(), 0);
        assert!(node.pending_transactions().is_empty());
    }

    // ==================== Mempool ====================

    #[test]
    fn pending_transactions_report_submission_order() {
        let (node, alice, bob) = funded();
        node.set_automine(false);

        node.submit(alice, approve_op(bob, units(100)), 100, GAS_LIMIT)
            .unwrap();
        node.submit(bob, transfer_op(alice, bob, units(1000)), 200, GAS_LIMIT)
            .unwrap();

        let pending = node.pending_transactions();
        let names: Vec<&str> = pending.iter().map(|t| t.operation.name()).collect();
        // Submission order, not mining order: the approve was submitted first.
        assert_eq!(names, vec!["approve", "transferFrom"]);
    }

    #[test]
    fn drop_transaction_withdraws_a_pending_call() {
        let (node, alice, bob) = funded();
        node.set_automine(false);

        let id = pending_id(
            node.submit(bob, transfer_op(alice, bob, units(1000)), 200, GAS_LIMIT)
                .unwrap(),
        );
        let dropped = node.drop_transaction(id).unwrap();
        assert_eq!(dropped.id, id);

        let block = node.mine();
        assert!(block.receipts.is_empty());
        assert_eq!(node.balance_of(bob), 0);
    }

    #[test]
    fn drop_transaction_fails_once_mined() {
        let node = Node::new();
        node.set_automine(false);
        let id = pending_id(
            node.submit(addr(9), mint_op(addr(1), 1), 1, GAS_LIMIT)
                .unwrap(),
        );
        node.mine();

        assert!(node.drop_transaction(id).is_none());
    }

    #[test]
    fn receipts_are_queryable_by_submission_id() {
        let node = Node::new();
        node.set_automine(false);
        let id = pending_id(
            node.submit(addr(9), mint_op(addr(1), units(5)), 1, GAS_LIMIT)
                .unwrap(),
        );
        assert!(node.receipt(id).is_none());

        node.mine();

        let receipt = node.receipt(id).unwrap();
        assert!(receipt.is_applied());
        assert_eq!(receipt.transaction.id, id);
    }

    // ==================== Approval races ====================

    #[test]
    fn approval_overwrite_is_front_run_by_a_pricier_spend() {
        let (node, alice, bob) = funded();
        node.set_automine(false);

        // alice lowers bob's allowance to 100; bob races it with a full spend.
        node.submit(alice, approve_op(bob, units(100)), 100, 80_000)
            .unwrap();
        node.submit(bob, transfer_op(alice, bob, units(1000)), 200, 150_000)
            .unwrap();
        assert_eq!(node.pending_transactions().len(), 2);

        let block = node.mine();

        // The pricier transferFrom mined first, then the approve overwrote
        // the already-spent allowance.
        let names: Vec<&str> = block.transactions().map(|t| t.operation.name()).collect();
        assert_eq!(names, vec!["transferFrom", "approve"]);
        assert!(block.receipts.iter().all(|r| r.is_applied()));
        assert_eq!(node.balance_of(bob), units(1000));
        assert_eq!(node.balance_of(alice), units(4000));
        assert_eq!(node.allowance_of(alice, bob), units(100));

        // The overwritten allowance is still spendable on top of the race.
        node.set_automine(true);
        node.submit(bob, transfer_op(alice, bob, units(100)), 200, 150_000)
            .unwrap();
        assert_eq!(node.balance_of(bob), units(1100));
        assert_eq!(node.balance_of(alice), units(3900));
        assert_eq!(node.allowance_of(alice, bob), 0);
    }

    #[test]
    fn allowance_increase_is_not_exploitable_by_front_running() {
        let node = Node::new();
        let (alice, bob) = (addr(1), addr(2));
        node.submit(addr(9), mint_op(alice, units(5000)), 1, GAS_LIMIT)
            .unwrap();

        node.set_automine(false);
        node.submit(alice, approve_op(bob, units(2000)), 50, GAS_LIMIT)
            .unwrap();
        node.submit(bob, transfer_op(alice, bob, units(1000)), 200, GAS_LIMIT)
            .unwrap();

        let block = node.mine();

        // The spend mined first against a zero allowance and reverted; the
        // approve then landed untouched.
        assert_eq!(
            block.receipts[0].transaction.operation.name(),
            "transferFrom"
        );
        assert!(matches!(
            block.receipts[0].revert_reason(),
            Some(LedgerError::InsufficientAllowance { .. })
        ));
        assert!(block.receipts[1].is_applied());
        assert_eq!(node.balance_of(bob), 0);
        assert_eq!(node.balance_of(alice), units(5000));
        assert_eq!(node.allowance_of(alice, bob), units(2000));

        // The full approved amount is still there to spend.
        node.set_automine(true);
        node.submit(bob, transfer_op(alice, bob, units(2000)), 200, GAS_LIMIT)
            .unwrap();
        assert_eq!(node.balance_of(bob), units(2000));
        assert_eq!(node.balance_of(alice), units(3000));
        assert_eq!(node.allowance_of(alice, bob), 0);
    }

    #[test]
    fn raising_an_active_allowance_composes_with_a_front_run_spend() {
        let (node, alice, bob) = funded();
        node.set_automine(false);

        node.submit(alice, approve_op(bob, units(2000)), 50, GAS_LIMIT)
            .unwrap();
        node.submit(bob, transfer_op(alice, bob, units(1000)), 200, GAS_LIMIT)
            .unwrap();

        let block = node.mine();
        assert_eq!(block.applied_count(), 2);

        // The spend consumed the old 1000 allowance, then the approve reset
        // it to 2000.
        assert_eq!(node.balance_of(bob), units(1000));
        assert_eq!(node.allowance_of(alice, bob), units(2000));

        node.set_automine(true);
        node.submit(bob, transfer_op(alice, bob, units(2000)), 200, GAS_LIMIT)
            .unwrap();
        assert_eq!(node.balance_of(bob), units(3000));
        assert_eq!(node.balance_of(alice), units(2000));
        assert_eq!(node.allowance_of(alice, bob), 0);
    }

    // ==================== Determinism & invariants ====================

    #[test]
    fn equal_gas_prices_mine_in_submission_order() {
        let node = Node::new();
        node.set_automine(false);
        let first = pending_id(
            node.submit(addr(9), mint_op(addr(1), 1), 40, GAS_LIMIT)
                .unwrap(),
        );
        let second = pending_id(
            node.submit(addr(9), mint_op(addr(2), 1), 40, GAS_LIMIT)
                .unwrap(),
        );
        let third = pending_id(
            node.submit(addr(9), mint_op(addr(3), 1), 40, GAS_LIMIT)
                .unwrap(),
        );

        let block = node.mine();
        let ids: Vec<TxId> = block.transactions().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[test]
    fn identical_submission_sequences_reproduce_identical_outcomes() {
        let run = || {
            let (node, alice, bob) = funded();
            node.set_automine(false);
            node.submit(alice, approve_op(bob, units(100)), 100, GAS_LIMIT)
                .unwrap();
            node.submit(bob, transfer_op(alice, bob, units(1000)), 200, GAS_LIMIT)
                .unwrap();
            let block = node.mine();

            let outcomes: Vec<(TxId, bool)> = block
                .receipts
                .iter()
                .map(|r| (r.transaction.id, r.is_applied()))
                .collect();
            (
                outcomes,
                node.balance_of(alice),
                node.balance_of(bob),
                node.allowance_of(alice, bob),
            )
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn automine_matches_batched_mining_for_equal_gas_prices() {
        let script = |node: &Node| {
            node.submit(addr(9), mint_op(addr(1), units(50)), 7, GAS_LIMIT)
                .unwrap();
            node.submit(addr(1), approve_op(addr(2), units(30)), 7, GAS_LIMIT)
                .unwrap();
            node.submit(
                addr(2),
                transfer_op(addr(1), addr(2), units(30)),
                7,
                GAS_LIMIT,
            )
            .unwrap();
        };

        let immediate = Node::new();
        script(&immediate);

        let batched = Node::new();
        batched.set_automine(false);
        script(&batched);
        batched.mine();

        for account in [addr(1), addr(2), addr(9)] {
            assert_eq!(immediate.balance_of(account), batched.balance_of(account));
        }
        assert_eq!(
            immediate.allowance_of(addr(1), addr(2)),
            batched.allowance_of(addr(1), addr(2))
        );
        assert_eq!(immediate.total_supply(), batched.total_supply());
    }

    #[test]
    fn reads_do_not_disturb_state() {
        let (node, alice, bob) = funded();
        let before = (
            node.balance_of(alice),
            node.allowance_of(alice, bob),
            node.total_supply(),
        );

        for _ in 0..3 {
            assert_eq!(node.balance_of(alice), before.0);
            assert_eq!(node.allowance_of(alice, bob), before.1);
            assert_eq!(node.total_supply(), before.2);
        }
        assert_eq!(node.height(), 2);
    }

    #[test]
    fn conservation_holds_after_every_block() {
        let node = Node::new();
        node.set_automine(false);
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let accounts: Vec<Address> = (1u8..=6).map(addr).collect();

        for _ in 0..20 {
            for _ in 0..8 {
                let sender = accounts[rng.gen_range(0..accounts.len())];
                let other = accounts[rng.gen_range(0..accounts.len())];
                let amount = units(rng.gen_range(0..500u64));
                let gas_price = rng.gen_range(1..=300u128);
                let operation = match rng.gen_range(0..3u8) {
                    0 => mint_op(other, amount),
                    1 => approve_op(other, amount),
                    _ => transfer_op(other, sender, amount),
                };
                node.submit(sender, operation, gas_price, GAS_LIMIT).unwrap();
            }
            node.mine();

            let held: u128 = accounts.iter().map(|a| node.balance_of(*a)).sum();
            assert_eq!(held, node.total_supply());
        }
    }
}
