//! Immutable blocks of mined transactions and their outcomes.

use crate::core::receipt::Receipt;
use crate::core::transaction::Transaction;
use crate::types::hash::Hash;

/// Immutable record of one mining pass.
///
/// Blocks link to their parent by hash and carry their receipts in the exact
/// order the miner applied them. Once sealed, nothing inside a block changes;
/// the receipt sequence is the audit trail of the pass.
#[derive(Clone, Debug)]
pub struct Block {
    /// Block index in the chain (genesis = 0).
    pub number: u64,
    /// Unix timestamp in nanoseconds at sealing time. Informational only:
    /// no ordering rule consults it.
    pub timestamp: u64,
    /// Hash of the parent block, forming the chain; zero for genesis.
    pub parent_hash: Hash,
    /// SHA3-256 identity computed over the sealed contents.
    pub hash: Hash,
    /// Mined transactions with their outcomes, in application order.
    pub receipts: Box<[Receipt]>,
}

impl Block {
    /// Seals a block: fixes its contents and computes its hash.
    pub fn seal(number: u64, timestamp: u64, parent_hash: Hash, receipts: Vec<Receipt>) -> Self {
        let hash = Self::compute_hash(number, timestamp, parent_hash, &receipts);
        Self {
            number,
            timestamp,
            parent_hash,
            hash,
            receipts: receipts.into_boxed_slice(),
        }
    }

    /// Creates the empty genesis block at height 0.
    pub fn genesis(timestamp: u64) -> Self {
        Self::seal(0, timestamp, Hash::ZERO, Vec::new())
    }

    /// Computes the block identity under a `"BLOCK"` domain tag.
    ///
    /// The preimage covers the header fields plus, per receipt, the
    /// transaction id and an applied/reverted marker, so two blocks holding
    /// the same transactions with different outcomes hash differently.
    fn compute_hash(number: u64, timestamp: u64, parent_hash: Hash, receipts: &[Receipt]) -> Hash {
        let mut h = Hash::tagged(b"BLOCK");
        h.write(&number.to_le_bytes());
        h.write(&timestamp.to_le_bytes());
        h.write(parent_hash.as_slice());
        for receipt in receipts {
            h.write(&receipt.transaction.id.to_le_bytes());
            h.write(&[receipt.is_applied() as u8]);
        }
        h.finish()
    }

    /// Iterates over the mined transactions in application order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.receipts.iter().map(|r| &r.transaction)
    }

    /// Number of receipts that applied.
    pub fn applied_count(&self) -> usize {
        self.receipts.iter().filter(|r| r.is_applied()).count()
    }

    /// Number of receipts that reverted.
    pub fn reverted_count(&self) -> usize {
        self.receipts.len() - self.applied_count()
    }
}
