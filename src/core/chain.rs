//! Block production: deterministic ordering, sequential application, history.

use crate::core::block::Block;
use crate::core::receipt::{Outcome, Receipt};
use crate::core::transaction::{Operation, Transaction, TxId};
use crate::ledger::{Ledger, LedgerError, StateDelta};
use crate::types::hash::Hash;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// The chain of sealed blocks and the miner that extends it.
///
/// [`Chain::mine_batch`] is the only path that mutates the ledger: it orders
/// the batch, applies each transaction in turn, and seals the receipts into
/// the next block. The whole pass runs under the chain lock, so concurrent
/// mining calls serialize and block numbers stay contiguous.
pub struct Chain {
    ledger: Ledger,
    /// Sealed blocks indexed by height; genesis sits at 0.
    blocks: Mutex<Vec<Arc<Block>>>,
    /// Transaction id to the height of the block that consumed it.
    tx_index: DashMap<TxId, u64>,
}

impl Chain {
    /// Creates a chain over `ledger` with a freshly sealed genesis block.
    pub fn new(ledger: Ledger) -> Self {
        let genesis = Arc::new(Block::genesis(now_nanos()));
        info!("initialized chain at genesis: hash={}", genesis.hash);

        Self {
            ledger,
            blocks: Mutex::new(vec![genesis]),
            tx_index: DashMap::new(),
        }
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Height of the latest sealed block.
    pub fn height(&self) -> u64 {
        self.blocks.lock().unwrap().len() as u64 - 1
    }

    /// Hash of the latest sealed block.
    pub fn tip(&self) -> Hash {
        self.latest_block().hash
    }

    /// Returns the latest sealed block.
    pub fn latest_block(&self) -> Arc<Block> {
        self.blocks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("the chain always holds its genesis block")
    }

    /// Returns the block at `number`, if sealed.
    pub fn get_block(&self, number: u64) -> Option<Arc<Block>> {
        self.blocks.lock().unwrap().get(number as usize).cloned()
    }

    /// Returns the receipt of transaction `id`, if a block consumed it.
    pub fn find_receipt(&self, id: TxId) -> Option<Receipt> {
        let number = *self.tx_index.get(&id)?;
        let block = self.get_block(number)?;
        block
            .receipts
            .iter()
            .find(|r| r.transaction.id == id)
            .cloned()
    }

    /// Orders, applies, and seals one batch of transactions as the next block.
    ///
    /// Ordering is gas price descending with ascending submission id breaking
    /// ties. Each transaction applies or reverts on its own; a revert never
    /// aborts the rest of the batch. An empty batch seals an empty block.
    pub fn mine_batch(&self, mut batch: Vec<Transaction>) -> Arc<Block> {
        let mut blocks = self.blocks.lock().unwrap();

        order_batch(&mut batch);

        let receipts: Vec<Receipt> = batch
            .into_iter()
            .map(|tx| {
                let outcome = match self.execute(&tx) {
                    Ok(delta) => Outcome::Applied(delta),
                    Err(e) => {
                        warn!(
                            "transaction {} ({}) reverted: {e}",
                            tx.id,
                            tx.operation.name()
                        );
                        Outcome::Reverted(e)
                    }
                };
                Receipt {
                    transaction: tx,
                    outcome,
                }
            })
            .collect();

        let number = blocks.len() as u64;
        let parent_hash = blocks.last().map(|b| b.hash).unwrap_or(Hash::ZERO);
        let block = Arc::new(Block::seal(number, now_nanos(), parent_hash, receipts));

        for receipt in block.receipts.iter() {
            self.tx_index.insert(receipt.transaction.id, number);
        }
        blocks.push(Arc::clone(&block));

        info!(
            "sealed block: height={} hash={} applied={} reverted={}",
            block.number,
            block.hash,
            block.applied_count(),
            block.reverted_count()
        );

        block
    }

    /// Runs one transaction against the ledger, mapping the sender into the
    /// role its operation implies.
    fn execute(&self, tx: &Transaction) -> Result<StateDelta, LedgerError> {
        match tx.operation {
            Operation::Mint { to, amount } => self.ledger.mint(to, amount),
            Operation::Approve { spender, amount } => {
                self.ledger.approve(tx.sender, spender, amount)
            }
            Operation::TransferFrom {
                owner,
                recipient,
                amount,
            } => self.ledger.transfer_from(tx.sender, owner, recipient, amount),
        }
    }
}

/// Sorts a batch into mining order: gas price descending, submission id
/// ascending on ties.
fn order_batch(batch: &mut [Transaction]) {
    batch.sort_by(|a, b| b.gas_price.cmp(&a.gas_price).then_with(|| a.id.cmp(&b.id)));
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
